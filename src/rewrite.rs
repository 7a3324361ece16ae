//! Positional placeholder rewriting
//!
//! The engine only understands named placeholders, so every `?` outside a
//! single-quoted literal is replaced by `:pN`, numbered from 0 in order of
//! appearance. `ALTER TABLE` / `CREATE TABLE` statements are left alone:
//! a literal `?` can appear in DDL (default clauses, check constraints)
//! and must not be touched.
//!
//! The same pass records the target table of an `INSERT INTO` statement;
//! that name later seeds the `<table>_id_seq` default used by
//! last-insert-id emulation.

/// Outcome of one rewrite pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    /// The (possibly) rewritten SQL text
    pub sql: String,
    /// Lowercased insert target table, when the SQL is an insert
    pub insert_table: Option<String>,
}

/// Rewrite positional placeholders and capture the insert target table
pub fn rewrite(sql: &str) -> Rewritten {
    let insert_table = capture_insert_table(sql);

    if is_ddl_exempt(sql) {
        return Rewritten {
            sql: sql.to_string(),
            insert_table,
        };
    }

    let mut out = String::with_capacity(sql.len() + 8);
    let mut counter = 0usize;
    let mut in_literal = false;

    for ch in sql.chars() {
        match ch {
            // A doubled quote inside a literal toggles out and straight
            // back in, which reads the same as staying inside
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '?' if !in_literal => {
                out.push_str(":p");
                out.push_str(&counter.to_string());
                counter += 1;
            }
            _ => out.push(ch),
        }
    }

    Rewritten {
        sql: out,
        insert_table,
    }
}

/// DDL statements are exempt from placeholder rewriting
fn is_ddl_exempt(sql: &str) -> bool {
    let mut words = sql.trim().split_whitespace();
    let first = words.next().unwrap_or("");
    let second = words.next().unwrap_or("");
    (first.eq_ignore_ascii_case("alter") || first.eq_ignore_ascii_case("create"))
        && second.eq_ignore_ascii_case("table")
}

/// Find `insert into <identifier>` (case-insensitive) and return the
/// identifier folded to lowercase
fn capture_insert_table(sql: &str) -> Option<String> {
    let lower = sql.to_lowercase();
    let pos = lower.find("insert into")?;
    let rest = &lower[pos + "insert into".len()..];
    let table: String = rest
        .trim_start()
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '(')
        .collect();
    if table.is_empty() {
        None
    } else {
        Some(table)
    }
}
