//! # Logical Plan
//!
//! A closed tagged union over the engine's logical operator kinds. The
//! physical plan builder matches it exhaustively, so adding a kind is a
//! compile-visible change everywhere it matters.

use std::fmt::Write;

use crate::exec::SortSpec;
use crate::expr::Expr;
use crate::types::ColumnRef;

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    Scan {
        table: String,
        alias: Option<String>,
    },
    Select {
        input: Box<LogicalPlan>,
        predicate: Expr,
    },
    Project {
        input: Box<LogicalPlan>,
        columns: Vec<ColumnRef>,
    },
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        condition: Option<Expr>,
    },
    Sort {
        input: Box<LogicalPlan>,
        keys: Vec<SortSpec>,
    },
    Distinct {
        input: Box<LogicalPlan>,
    },
}

impl LogicalPlan {
    pub fn scan(table: impl Into<String>, alias: Option<&str>) -> Self {
        LogicalPlan::Scan {
            table: table.into(),
            alias: alias.map(str::to_string),
        }
    }

    pub fn select(self, predicate: Expr) -> Self {
        LogicalPlan::Select {
            input: Box::new(self),
            predicate,
        }
    }

    pub fn project(self, columns: Vec<ColumnRef>) -> Self {
        LogicalPlan::Project {
            input: Box::new(self),
            columns,
        }
    }

    pub fn join(self, right: LogicalPlan, condition: Option<Expr>) -> Self {
        LogicalPlan::Join {
            left: Box::new(self),
            right: Box::new(right),
            condition,
        }
    }

    pub fn sort(self, keys: Vec<SortSpec>) -> Self {
        LogicalPlan::Sort {
            input: Box::new(self),
            keys,
        }
    }

    pub fn distinct(self) -> Self {
        LogicalPlan::Distinct {
            input: Box::new(self),
        }
    }

    pub fn explain(&self) -> String {
        let mut output = String::new();
        self.format_node(0, &mut output);
        output
    }

    fn format_node(&self, indent: usize, output: &mut String) {
        let prefix = "  ".repeat(indent);
        match self {
            LogicalPlan::Scan { table, alias } => {
                let _ = match alias {
                    Some(alias) => writeln!(output, "{prefix}-> Scan on {table} as {alias}"),
                    None => writeln!(output, "{prefix}-> Scan on {table}"),
                };
            }
            LogicalPlan::Select { input, predicate } => {
                let _ = writeln!(output, "{prefix}-> Select ({predicate})");
                input.format_node(indent + 1, output);
            }
            LogicalPlan::Project { input, columns } => {
                let names: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
                let _ = writeln!(output, "{prefix}-> Project [{}]", names.join(", "));
                input.format_node(indent + 1, output);
            }
            LogicalPlan::Join {
                left,
                right,
                condition,
            } => {
                let _ = match condition {
                    Some(condition) => writeln!(output, "{prefix}-> Join ({condition})"),
                    None => writeln!(output, "{prefix}-> Join (cross)"),
                };
                left.format_node(indent + 1, output);
                right.format_node(indent + 1, output);
            }
            LogicalPlan::Sort { input, keys } => {
                let keys: Vec<String> = keys
                    .iter()
                    .map(|k| {
                        format!(
                            "{}{}",
                            k.column,
                            if k.descending { " desc" } else { "" }
                        )
                    })
                    .collect();
                let _ = writeln!(output, "{prefix}-> Sort [{}]", keys.join(", "));
                input.format_node(indent + 1, output);
            }
            LogicalPlan::Distinct { input } => {
                let _ = writeln!(output, "{prefix}-> Distinct");
                input.format_node(indent + 1, output);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explain_renders_the_tree() {
        let plan = LogicalPlan::scan("Sailors", Some("S"))
            .join(
                LogicalPlan::scan("Reserves", None),
                Some(Expr::equals(
                    Expr::column("S", "id"),
                    Expr::column("Reserves", "sid"),
                )),
            )
            .distinct();

        let explain = plan.explain();
        assert_eq!(
            explain,
            "-> Distinct\n  -> Join (S.id = Reserves.sid)\n    -> Scan on Sailors as S\n    -> Scan on Reserves\n"
        );
    }
}
