/*
Copyright (c) 2022 VMware, Inc.
SPDX-License-Identifier: MIT
Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
 */

//! Read-only queries against the OVN southbound database through `ovn-sbctl`.
//!
//! Queries use `--bare` output, which prints just the values of the requested column, one
//! record per line, with no headings.

use super::run::{CommandError, CommandRunner, Location};

const OVN_SBCTL: &str = "ovn-sbctl";

/// Formats an `ovn-sbctl find` condition that compares `column` to the string `value`.  OVSDB
/// string values have to be quoted, or `ovn-sbctl` tries to parse them as UUIDs or numbers.
pub fn string_condition(column: &str, value: &str) -> String {
    let mut s = String::with_capacity(column.len() + value.len() + 3);
    s.push_str(column);
    s.push_str("=\"");
    for c in value.chars() {
        if c == '"' || c == '\\' {
            s.push('\\');
        }
        s.push(c);
    }
    s.push('"');
    s
}

/// Returns the lines of `--bare` output that aren't blank, trimmed.
pub fn bare_values(output: &str) -> Vec<&str> {
    output.lines().map(str::trim).filter(|line| !line.is_empty()).collect()
}

#[derive(Clone, Debug)]
pub struct Sbctl<R> {
    runner: R,
    location: Location,
}

impl<R: CommandRunner> Sbctl<R> {
    pub fn new(runner: R, location: Location) -> Sbctl<R> {
        Sbctl { runner, location }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn bare(&self, column: &str, args: &[&str]) -> Result<String, CommandError> {
        let columns = format!("--columns={column}");
        let mut tail = vec!["--bare", columns.as_str()];
        tail.extend_from_slice(args);
        self.runner.run(&self.location.argv(OVN_SBCTL, tail))
    }

    /// `ovn-sbctl --bare --columns=<column> find <table> <conditions...>`
    pub fn find(&self, table: &str, column: &str, conditions: &[String]) -> Result<String, CommandError> {
        let mut args = vec!["find", table];
        args.extend(conditions.iter().map(String::as_str));
        self.bare(column, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<Vec<String>>>);

    impl CommandRunner for Recorder {
        fn run(&self, argv: &[String]) -> Result<String, CommandError> {
            self.0.lock().unwrap().push(argv.to_vec());
            Ok("42\n".into())
        }
    }

    #[test]
    fn conditions_are_quoted() {
        assert_eq!(string_condition("logical_port", "lsp-123"), r#"logical_port="lsp-123""#);
        assert_eq!(string_condition("name", r#"a"b\c"#), r#"name="a\"b\\c""#);
    }

    #[test]
    fn find_command_lines() {
        let sbctl = Sbctl::new(Recorder(Mutex::new(Vec::new())), Location::Host);
        let cond = string_condition("logical_port", "lsp-1");
        assert_eq!(sbctl.find("port_binding", "tunnel_key", &[cond]).unwrap(), "42\n");
        sbctl.find("datapath_binding", "tunnel_key", &["_uuid=dp-7".to_string()]).unwrap();

        let calls = sbctl.runner.0.lock().unwrap();
        assert_eq!(calls[0], ["ovn-sbctl", "--bare", "--columns=tunnel_key",
                              "find", "port_binding", "logical_port=\"lsp-1\""]);
        assert_eq!(calls[1], ["ovn-sbctl", "--bare", "--columns=tunnel_key",
                              "find", "datapath_binding", "_uuid=dp-7"]);
    }

    #[test]
    fn bare_values_drop_blank_lines() {
        assert_eq!(bare_values("\n  7 \n\n8\n"), ["7", "8"]);
        assert!(bare_values("\n \n").is_empty());
    }
}
