//! Interactive editing session
//!
//! Each line is one edit event against the row store; the grid is
//! re-rendered after every mutation so computed fields are visible
//! immediately. The assembled payload is printed on `submit`, posting it
//! anywhere is left to whoever reads stdout.

use std::io::BufRead;

use crate::cli::render::FormView;
use crate::form::descriptor::Registry;
use crate::form::row::{FieldPath, FieldValue, RowStore};
use crate::form::submit;

const HELP: &str = "\
commands:
  set <row> <path> <value>    edit a field ('custom_fields.<id>' or a plain name)
  auto <row> <item>           fire the auto-post trigger
  file <row> <item> <name>    attach a file by name
  add                         append a new row
  show                        render the form
  submit                      validate and print the assembled payload
  quit";

pub struct Session<'r> {
    registry: &'r Registry,
    store: RowStore,
}

impl<'r> Session<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            store: RowStore::new(registry),
        }
    }

    pub fn run<R: BufRead>(&mut self, input: R) {
        println!("{}", self.view());
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            if !self.exec(line.trim()) {
                break;
            }
        }
    }

    fn view(&self) -> FormView<'_> {
        FormView::from(self.registry, self.store.rows(), self.store.warnings())
    }

    /// Execute one command; `false` ends the session
    fn exec(&mut self, line: &str) -> bool {
        let mut words = line.split_whitespace();
        match words.next() {
            None => true,
            Some("quit") | Some("q") => false,
            Some("help") => {
                println!("{}", HELP);
                true
            }
            Some("show") => {
                println!("{}", self.view());
                true
            }
            Some("add") => {
                self.store.append_row(self.registry);
                println!("{}", self.view());
                true
            }
            Some("set") => {
                let (row, path) = (words.next(), words.next());
                let value = words.collect::<Vec<_>>().join(" ");
                match (row.and_then(|r| r.parse::<usize>().ok()), path) {
                    (Some(row), Some(path)) => {
                        let path = FieldPath::parse(path);
                        match self
                            .store
                            .set_field(self.registry, row, &path, FieldValue::Text(value))
                        {
                            Ok(()) => println!("{}", self.view()),
                            Err(e) => eprintln!("--> Error: {}", e),
                        }
                    }
                    _ => eprintln!("--> Error: usage: set <row> <path> <value>"),
                }
                true
            }
            Some("auto") => {
                match (words.next().and_then(|r| r.parse::<usize>().ok()), words.next()) {
                    (Some(row), Some(item)) => {
                        match self.store.auto_post(self.registry, row, item) {
                            Ok(()) => println!("{}", self.view()),
                            Err(e) => eprintln!("--> Error: {}", e),
                        }
                    }
                    _ => eprintln!("--> Error: usage: auto <row> <item>"),
                }
                true
            }
            Some("file") => {
                let (row, item) = (
                    words.next().and_then(|r| r.parse::<usize>().ok()),
                    words.next(),
                );
                let name = words.collect::<Vec<_>>().join(" ");
                match (row, item) {
                    (Some(row), Some(item)) if !name.is_empty() => {
                        let path = FieldPath::Plain(item.to_string());
                        match self
                            .store
                            .set_field(self.registry, row, &path, FieldValue::Text(name))
                        {
                            Ok(()) => println!("{}", self.view()),
                            Err(e) => eprintln!("--> Error: {}", e),
                        }
                    }
                    _ => eprintln!("--> Error: usage: file <row> <item> <name>"),
                }
                true
            }
            Some("submit") => {
                match submit::assemble(self.registry, self.store.rows()) {
                    Ok(records) => match serde_json::to_string_pretty(&records) {
                        Ok(payload) => println!("{}", payload),
                        Err(e) => eprintln!("--> Error: {}", e),
                    },
                    Err(errs) => {
                        for e in errs {
                            eprintln!("--> Error: {}", e);
                        }
                    }
                }
                true
            }
            Some(other) => {
                eprintln!("--> Error: unknown command '{}' (try 'help')", other);
                true
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::load;

    #[test]
    fn scripted_session() {
        let reg = load::builtin();
        let mut session = Session::new(&reg);
        let script = "\
set 0 productLot L1
auto 0 inspectionData1
set 0 custom_fields.inspectionData2 5
file 0 inspectionFile scan.csv
add
quit
ignored after quit";
        session.run(script.as_bytes());
        assert_eq!(session.store.rows().len(), 2);
        let row = &session.store.rows()[0];
        assert_eq!(row.product_lot, "L1");
        assert_eq!(row.custom_fields["inspectionData1"], 100.0);
        assert_eq!(row.custom_fields["formula"], 500.0);
        assert_eq!(row.attachments["inspectionFile"], "scan.csv");
    }

    #[test]
    fn bad_commands_do_not_end_the_session() {
        let reg = load::builtin();
        let mut session = Session::new(&reg);
        assert!(session.exec("frobnicate"));
        assert!(session.exec("set nope"));
        assert!(session.exec("auto 9 inspectionData1"));
        assert!(!session.exec("quit"));
        assert_eq!(session.store.rows().len(), 1);
    }
}
