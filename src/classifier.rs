use crate::models::Classification;
use once_cell::sync::Lazy;
use regex::{Captures, NoExpand, Regex};

type Rewrite = fn(&str, &Captures<'_>) -> Option<String>;

struct FailureSignature {
    name: &'static str,
    description: &'static str,
    patterns: Vec<Regex>,
    rewrite: Rewrite,
}

impl FailureSignature {
    fn new(name: &'static str, description: &'static str, patterns: &[&str], rewrite: Rewrite) -> Self {
        Self {
            name,
            description,
            patterns: patterns
                .iter()
                .map(|pattern| Regex::new(pattern).expect("valid regex"))
                .collect(),
            rewrite,
        }
    }
}

// Order matters: the first signature producing a different text wins.
static SIGNATURES: Lazy<Vec<FailureSignature>> = Lazy::new(|| {
    vec![
        FailureSignature::new(
            "unknown_table",
            "Replaced a friendly table name with the PSA schema table",
            &[
                r"(?i)invalid object name '(?:\[?\w+\]?\.)*\[?(?P<name>\w+)\]?'",
                r"(?i)no such table: (?:\w+\.)?(?P<name>\w+)",
            ],
            rename_table,
        ),
        FailureSignature::new(
            "unknown_column",
            "Replaced a friendly column name with the PSA schema column",
            &[
                r"(?i)invalid column name '(?P<name>\w+)'",
                r"(?i)no such column: (?:\w+\.)?(?P<name>\w+)",
            ],
            rename_column,
        ),
        FailureSignature::new(
            "ambiguous_column",
            "Qualified an ambiguous column with the primary table",
            &[r"(?i)ambiguous column name:?\s*'?(?:\w+\.)?(?P<name>\w+)'?"],
            qualify_ambiguous_column,
        ),
        FailureSignature::new(
            "missing_group_by",
            "Added a non-aggregated column to the GROUP BY clause",
            &[
                r"(?i)column '(?P<name>[\w.\[\]]+)' is invalid in the select list because it is not contained in either an aggregate function or the group by clause",
                r#"(?i)column "(?P<name>[\w.]+)" must appear in the group by clause"#,
            ],
            add_group_by_column,
        ),
        FailureSignature::new(
            "order_by_in_subquery",
            "Removed ORDER BY from a nested query",
            &[r"(?i)the order by clause is invalid in views, inline functions, derived tables, subqueries"],
            strip_nested_order_by,
        ),
        FailureSignature::new(
            "limit_syntax",
            "Rewrote LIMIT n as SELECT TOP n",
            &[r"(?i)incorrect syntax near '(?P<name>limit)'"],
            limit_to_top,
        ),
        FailureSignature::new(
            "top_syntax",
            "Rewrote SELECT TOP n as LIMIT n",
            &[r#"(?i)near "(?P<name>[^"]+)": syntax error"#],
            top_to_limit,
        ),
        FailureSignature::new(
            "unknown_function",
            "Translated a function into the dialect equivalent",
            &[
                r"(?i)'(?P<name>\w+)' is not a recognized built-in function name",
                r"(?i)(?P<sqlite>no such function): (?P<name>\w+)",
            ],
            translate_function,
        ),
        FailureSignature::new(
            "divide_by_zero",
            "Guarded divisors with NULLIF(divisor, 0)",
            &[r"(?i)divide by zero error encountered", r"(?i)division by zero"],
            guard_divisors,
        ),
    ]
});

static TABLE_ALIASES: &[(&str, &str)] = &[
    ("tickets", "Faults"),
    ("ticket", "Faults"),
    ("requests", "Faults"),
    ("incidents", "Faults"),
    ("clients", "Area"),
    ("client", "Area"),
    ("customers", "Area"),
    ("customer", "Area"),
    ("agents", "Uname"),
    ("agent", "Uname"),
    ("users", "Uname"),
    ("technicians", "Uname"),
    ("statuses", "TStatus"),
    ("ticket_status", "TStatus"),
    ("priorities", "Priority"),
    ("tickettypes", "RequestType"),
    ("ticket_types", "RequestType"),
    ("requesttypes", "RequestType"),
    ("request_types", "RequestType"),
];

static COLUMN_ALIASES: &[(&str, &str)] = &[
    ("priority", "Seriousness"),
    ("priority_id", "Seriousness"),
    ("priorityid", "Seriousness"),
    ("summary", "Symptom"),
    ("subject", "Symptom"),
    ("title", "Symptom"),
    ("status_id", "Status"),
    ("statusid", "Status"),
    ("client_id", "Areaint"),
    ("clientid", "Areaint"),
    ("customer_id", "Areaint"),
    ("area_id", "Areaint"),
    ("agent_id", "Assignedtoint"),
    ("agentid", "Assignedtoint"),
    ("assigned_to", "Assignedtoint"),
    ("assignee_id", "Assignedtoint"),
    ("technician_id", "Assignedtoint"),
    ("team", "Sectio_"),
    ("team_name", "Sectio_"),
    ("section", "Sectio_"),
    ("request_type", "RequestTypeNew"),
    ("request_type_id", "RequestTypeNew"),
    ("ticket_type", "RequestTypeNew"),
    ("created", "Dateoccured"),
    ("created_at", "Dateoccured"),
    ("date_created", "Dateoccured"),
    ("opened_at", "Dateoccured"),
    ("dateoccurred", "Dateoccured"),
    ("closed_at", "Datecleared"),
    ("date_closed", "Datecleared"),
    ("resolved_at", "Datecleared"),
    ("due_date", "FixByDate"),
    ("deadline", "FixByDate"),
    ("sla_state", "SLAState"),
    ("sla_status", "SLAState"),
    ("deleted", "FDeleted"),
    ("is_deleted", "FDeleted"),
    ("ticket_id", "Faultid"),
    ("status_name", "tstatusdesc"),
    ("priority_name", "pdesc"),
    ("client_name", "aareadesc"),
    ("agent_name", "uname"),
];

#[derive(Debug, Clone, Copy)]
enum Translation {
    Rename(&'static str),
    Call(&'static str),
}

static TO_SQLITE: &[(&str, Translation)] = &[
    ("isnull", Translation::Rename("IFNULL")),
    ("len", Translation::Rename("LENGTH")),
    ("datalength", Translation::Rename("LENGTH")),
    ("substring", Translation::Rename("SUBSTR")),
    ("getdate", Translation::Call("DATETIME('now')")),
    ("getutcdate", Translation::Call("DATETIME('now')")),
    ("sysdatetime", Translation::Call("DATETIME('now')")),
    ("now", Translation::Call("DATETIME('now')")),
];

static TO_TSQL: &[(&str, Translation)] = &[
    ("ifnull", Translation::Rename("ISNULL")),
    ("nvl", Translation::Rename("ISNULL")),
    ("length", Translation::Rename("LEN")),
    ("substr", Translation::Rename("SUBSTRING")),
    ("now", Translation::Call("GETDATE()")),
    ("current_date", Translation::Call("CAST(GETDATE() AS DATE)")),
];

static PRIMARY_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bFROM\s+(?:\[?\w+\]?\.)?\[?(?P<table>\w+)\]?(?:\s+(?:AS\s+)?(?P<alias>\w+))?")
        .expect("valid regex")
});
static GROUP_BY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bGROUP\s+BY\s+").expect("valid regex"));
static AFTER_GROUP_BY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(?:HAVING|ORDER\s+BY|LIMIT)\b").expect("valid regex"));
static ORDER_BY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").expect("valid regex"));
static TRAILING_LIMIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+LIMIT\s+(?P<count>\d+)\s*;?\s*$").expect("valid regex"));
static LEADING_SELECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*SELECT\s+(?P<distinct>DISTINCT\s+)?").expect("valid regex"));
static LEADING_TOP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*SELECT\s+(?P<distinct>DISTINCT\s+)?TOP\s*\(?\s*(?P<count>\d+)\s*\)?\s+")
        .expect("valid regex")
});

const CLAUSE_KEYWORDS: &[&str] = &[
    "where", "join", "inner", "left", "right", "full", "outer", "cross", "on", "group", "order", "having", "limit",
    "union", "with",
];

/// Matches a failure message against the signature table and proposes a
/// repaired query text. Pure: the same inputs always give the same result.
pub fn analyze(sql: &str, error_message: &str) -> Classification {
    for signature in SIGNATURES.iter() {
        for pattern in &signature.patterns {
            let Some(captures) = pattern.captures(error_message) else {
                continue;
            };
            match (signature.rewrite)(sql, &captures) {
                Some(repaired) if repaired != sql => {
                    return Classification {
                        matched: true,
                        signature: Some(signature.name.to_string()),
                        description: Some(signature.description.to_string()),
                        repaired_sql: Some(repaired),
                    };
                }
                _ => {}
            }
        }
    }
    Classification::unmatched()
}

pub fn signature_names() -> Vec<&'static str> {
    SIGNATURES.iter().map(|signature| signature.name).collect()
}

// ─── Rewrites ───────────────────────────────────────────────────────────────

fn rename_table(sql: &str, captures: &Captures<'_>) -> Option<String> {
    let name = captures.name("name")?.as_str();
    let target = lookup(TABLE_ALIASES, name)?;
    Some(rewrite_identifier(sql, name, target, Position::Table))
}

fn rename_column(sql: &str, captures: &Captures<'_>) -> Option<String> {
    let name = captures.name("name")?.as_str();
    let target = lookup(COLUMN_ALIASES, name)?;
    Some(rewrite_identifier(sql, name, target, Position::Column))
}

fn qualify_ambiguous_column(sql: &str, captures: &Captures<'_>) -> Option<String> {
    let name = captures.name("name")?.as_str();
    let from = PRIMARY_FROM.captures(sql)?;
    let qualifier = from
        .name("alias")
        .map(|alias| alias.as_str())
        .filter(|alias| !CLAUSE_KEYWORDS.iter().any(|keyword| alias.eq_ignore_ascii_case(keyword)))
        .or_else(|| from.name("table").map(|table| table.as_str()))?;
    let qualified = format!("{}.{}", qualifier, name);
    Some(rewrite_identifier(sql, name, &qualified, Position::Unqualified))
}

fn add_group_by_column(sql: &str, captures: &Captures<'_>) -> Option<String> {
    let column = captures.name("name")?.as_str().replace(['[', ']'], "");
    let (body, tail) = split_terminator(sql);

    if let Some(group) = GROUP_BY.find(body) {
        let list_start = group.end();
        let list_end = AFTER_GROUP_BY
            .find(&body[list_start..])
            .map_or(body.len(), |clause| list_start + clause.start());
        let list = &body[list_start..list_end];
        if list.split(',').any(|item| item.trim().eq_ignore_ascii_case(&column)) {
            return None;
        }
        let insert_at = list_start + list.trim_end().len();
        return Some(format!("{}, {}{}{}", &body[..insert_at], column, &body[insert_at..], tail));
    }

    let insert_at = AFTER_GROUP_BY.find(body).map_or(body.len(), |clause| clause.start());
    Some(format!(
        "{} GROUP BY {}{}{}",
        body[..insert_at].trim_end(),
        column,
        &body[insert_at..],
        tail
    ))
}

fn strip_nested_order_by(sql: &str, _captures: &Captures<'_>) -> Option<String> {
    let mut removals = Vec::new();
    for found in ORDER_BY.find_iter(sql) {
        let prefix = &sql[..found.start()];
        if !paren_depth(prefix).is_some_and(|depth| depth > 0) {
            continue;
        }
        // Window specifications legitimately order.
        if opening_paren(prefix).is_some_and(|open| previous_word(&sql[..open]).is_some_and(|w| w.eq_ignore_ascii_case("over"))) {
            continue;
        }
        if let Some(close) = closing_paren(sql, found.end()) {
            removals.push((prefix.trim_end().len(), close));
        }
    }
    if removals.is_empty() {
        return None;
    }

    let mut repaired = String::with_capacity(sql.len());
    let mut last = 0;
    for (start, end) in removals {
        if start < last {
            continue;
        }
        repaired.push_str(&sql[last..start]);
        last = end;
    }
    repaired.push_str(&sql[last..]);
    Some(repaired)
}

fn limit_to_top(sql: &str, _captures: &Captures<'_>) -> Option<String> {
    let limit = TRAILING_LIMIT.captures(sql)?;
    let count = limit.name("count")?.as_str();
    let body = &sql[..limit.get(0)?.start()];
    let select = LEADING_SELECT.captures(body)?;
    let distinct = select.name("distinct").map_or("", |m| m.as_str());
    Some(format!("SELECT {}TOP {} {}", distinct, count, &body[select.get(0)?.end()..]))
}

fn top_to_limit(sql: &str, _captures: &Captures<'_>) -> Option<String> {
    let top = LEADING_TOP.captures(sql)?;
    let count = top.name("count")?.as_str();
    let distinct = top.name("distinct").map_or("", |m| m.as_str());
    let (body, _) = split_terminator(&sql[top.get(0)?.end()..]);
    Some(format!("SELECT {}{} LIMIT {}", distinct, body, count))
}

fn translate_function(sql: &str, captures: &Captures<'_>) -> Option<String> {
    let name = captures.name("name")?.as_str();
    let table = if captures.name("sqlite").is_some() { TO_SQLITE } else { TO_TSQL };
    let translation = table
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map(|(_, translation)| *translation)?;

    let escaped = regex::escape(name);
    match translation {
        Translation::Rename(target) => {
            let pattern = Regex::new(&format!(r"(?i)\b{}\s*\(", escaped)).ok()?;
            Some(pattern.replace_all(sql, NoExpand(&format!("{}(", target))).into_owned())
        }
        Translation::Call(target) => {
            let pattern = Regex::new(&format!(r"(?i)\b{}\s*\(\s*\)", escaped)).ok()?;
            Some(pattern.replace_all(sql, NoExpand(target)).into_owned())
        }
    }
}

fn guard_divisors(sql: &str, _captures: &Captures<'_>) -> Option<String> {
    let mut repaired = String::with_capacity(sql.len() + 16);
    let mut in_literal = false;
    let mut changed = false;
    let mut index = 0;

    while let Some(current) = sql[index..].chars().next() {
        if current == '\'' {
            in_literal = !in_literal;
        }
        if current == '/' && !in_literal && !sql[index + 1..].starts_with('*') {
            let rest = &sql[index + 1..];
            let start = index + 1 + (rest.len() - rest.trim_start().len());
            if let Some(end) = divisor_end(sql, start) {
                let divisor = &sql[start..end];
                if !is_guarded(divisor) && !is_nonzero_literal(divisor) {
                    repaired.push_str("/ NULLIF(");
                    repaired.push_str(divisor);
                    repaired.push_str(", 0)");
                    changed = true;
                    index = end;
                    continue;
                }
            }
        }
        repaired.push(current);
        index += current.len_utf8();
    }

    changed.then_some(repaired)
}

// ─── Text helpers ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Table,
    Column,
    Unqualified,
}

fn lookup(aliases: &[(&str, &'static str)], name: &str) -> Option<&'static str> {
    aliases
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
        .map(|(_, target)| *target)
        .filter(|target| !target.eq_ignore_ascii_case(name))
}

/// Replaces whole-word occurrences of `word` outside string literals,
/// keeping only those in the requested syntactic position.
fn rewrite_identifier(sql: &str, word: &str, replacement: &str, position: Position) -> String {
    let Ok(pattern) = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))) else {
        return sql.to_string();
    };

    sql.split('\'')
        .enumerate()
        .map(|(index, segment)| {
            if index % 2 == 1 {
                return segment.to_string();
            }
            let mut rewritten = String::with_capacity(segment.len());
            let mut last = 0;
            for found in pattern.find_iter(segment) {
                let before = segment[..found.start()].trim_end_matches('[');
                let after = segment[found.end()..].trim_start_matches(']');
                if accepts(position, before, after) {
                    rewritten.push_str(&segment[last..found.start()]);
                    rewritten.push_str(replacement);
                    last = found.end();
                }
            }
            rewritten.push_str(&segment[last..]);
            rewritten
        })
        .collect::<Vec<_>>()
        .join("'")
}

fn accepts(position: Position, before: &str, after: &str) -> bool {
    let qualifies_next = after.starts_with('.');
    let qualified = before.ends_with('.');
    match position {
        Position::Table => qualifies_next || in_table_position(before),
        Position::Column => !qualifies_next && !in_table_position(before) && !follows_keyword(before, "as"),
        Position::Unqualified => {
            !qualified && !qualifies_next && !in_table_position(before) && !follows_keyword(before, "as")
        }
    }
}

fn in_table_position(before: &str) -> bool {
    let mut rest = before;
    if let Some(schema) = rest.strip_suffix('.') {
        rest = schema.trim_end_matches(|c: char| is_word_char(c) || c == '[' || c == ']');
    }
    follows_keyword(rest, "from") || follows_keyword(rest, "join")
}

fn follows_keyword(before: &str, keyword: &str) -> bool {
    previous_word(before).is_some_and(|word| word.eq_ignore_ascii_case(keyword))
}

fn previous_word(before: &str) -> Option<&str> {
    let trimmed = before.trim_end();
    let start = trimmed
        .char_indices()
        .rev()
        .find(|(_, c)| !is_word_char(*c))
        .map_or(0, |(index, c)| index + c.len_utf8());
    let word = &trimmed[start..];
    (!word.is_empty()).then_some(word)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn split_terminator(sql: &str) -> (&str, &str) {
    let body = sql.trim_end().trim_end_matches(';').trim_end();
    (body, &sql[body.len()..])
}

/// Open parenthesis depth at the end of `prefix`, or `None` inside a literal.
fn paren_depth(prefix: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_literal = false;
    for c in prefix.chars() {
        match c {
            '\'' => in_literal = !in_literal,
            '(' if !in_literal => depth += 1,
            ')' if !in_literal => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    (!in_literal).then_some(depth)
}

fn opening_paren(prefix: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, c) in prefix.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' if depth == 0 => return Some(index),
            '(' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Byte index of the `)` closing the group that is open at `from`.
fn closing_paren(sql: &str, from: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_literal = false;
    for (offset, c) in sql[from..].char_indices() {
        match c {
            '\'' => in_literal = !in_literal,
            '(' if !in_literal => depth += 1,
            ')' if !in_literal => {
                if depth == 0 {
                    return Some(from + offset);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

fn divisor_end(sql: &str, start: usize) -> Option<usize> {
    let rest = &sql[start..];
    if rest.starts_with('(') {
        return closing_paren(sql, start + 1).map(|close| close + 1);
    }
    let word_len = rest
        .find(|c: char| !(is_word_char(c) || c == '.'))
        .unwrap_or(rest.len());
    if word_len == 0 {
        return None;
    }
    let after = start + word_len;
    if sql[after..].starts_with('(') {
        return closing_paren(sql, after + 1).map(|close| close + 1);
    }
    Some(after)
}

fn is_guarded(divisor: &str) -> bool {
    divisor
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("nullif"))
}

fn is_nonzero_literal(divisor: &str) -> bool {
    divisor.parse::<f64>().is_ok_and(|value| value != 0.0)
}

#[cfg(test)]
mod tests {
    use super::{analyze, signature_names};

    fn repaired(sql: &str, message: &str) -> String {
        let classification = analyze(sql, message);
        assert!(classification.matched, "expected a repair for {message}");
        classification.repaired_sql.expect("repaired sql")
    }

    #[test]
    fn signatures_are_ordered() {
        assert_eq!(
            signature_names(),
            vec![
                "unknown_table",
                "unknown_column",
                "ambiguous_column",
                "missing_group_by",
                "order_by_in_subquery",
                "limit_syntax",
                "top_syntax",
                "unknown_function",
                "divide_by_zero",
            ]
        );
    }

    #[test]
    fn unknown_table_maps_friendly_names_in_table_positions() {
        let sql = "SELECT COUNT(*) AS Total FROM Tickets WHERE Tickets.Status <> 9 AND Symptom <> 'tickets'";
        assert_eq!(
            repaired(sql, "no such table: Tickets in SELECT COUNT(*) at offset 30"),
            "SELECT COUNT(*) AS Total FROM Faults WHERE Faults.Status <> 9 AND Symptom <> 'tickets'"
        );
        assert_eq!(
            repaired("SELECT * FROM dbo.[Clients]", "Invalid object name 'dbo.Clients'."),
            "SELECT * FROM dbo.[Area]"
        );
    }

    #[test]
    fn unknown_column_leaves_same_named_tables_alone() {
        let sql = "SELECT p.pdesc, COUNT(*) FROM Faults f JOIN Priority p ON p.PriorityId = f.priority GROUP BY priority";
        assert_eq!(
            repaired(sql, "no such column: f.priority"),
            "SELECT p.pdesc, COUNT(*) FROM Faults f JOIN Priority p ON p.PriorityId = f.Seriousness GROUP BY Seriousness"
        );
        assert_eq!(
            repaired("SELECT team FROM Faults", "Invalid column name 'team'."),
            "SELECT Sectio_ FROM Faults"
        );
    }

    #[test]
    fn ambiguous_column_is_qualified_with_the_primary_alias() {
        let sql = "SELECT Status, COUNT(*) FROM Faults f JOIN Archive a ON a.Faultid = f.Faultid GROUP BY Status";
        assert_eq!(
            repaired(sql, "ambiguous column name: Status"),
            "SELECT f.Status, COUNT(*) FROM Faults f JOIN Archive a ON a.Faultid = f.Faultid GROUP BY f.Status"
        );
    }

    #[test]
    fn missing_group_by_extends_or_creates_the_clause() {
        let message = "Column 'Faults.Sectio_' is invalid in the select list because it is not contained in either an aggregate function or the GROUP BY clause.";
        assert_eq!(
            repaired("SELECT Sectio_, Status, COUNT(*) FROM Faults GROUP BY Status ORDER BY 3 DESC", message),
            "SELECT Sectio_, Status, COUNT(*) FROM Faults GROUP BY Status, Faults.Sectio_ ORDER BY 3 DESC"
        );
        assert_eq!(
            repaired("SELECT Sectio_, COUNT(*) FROM Faults;", message),
            "SELECT Sectio_, COUNT(*) FROM Faults GROUP BY Faults.Sectio_;"
        );
    }

    #[test]
    fn nested_order_by_is_removed_but_window_ordering_kept() {
        let message = "The ORDER BY clause is invalid in views, inline functions, derived tables, subqueries, and common table expressions, unless TOP, OFFSET or FOR XML is also specified.";
        let sql = "SELECT x.n, ROW_NUMBER() OVER (ORDER BY x.n) FROM (SELECT Status AS n FROM Faults ORDER BY Status) x ORDER BY 1";
        assert_eq!(
            repaired(sql, message),
            "SELECT x.n, ROW_NUMBER() OVER (ORDER BY x.n) FROM (SELECT Status AS n FROM Faults) x ORDER BY 1"
        );
    }

    #[test]
    fn limit_and_top_are_translated_in_both_directions() {
        assert_eq!(
            repaired("SELECT Faultid FROM Faults ORDER BY Dateoccured DESC LIMIT 10;", "Incorrect syntax near 'LIMIT'."),
            "SELECT TOP 10 Faultid FROM Faults ORDER BY Dateoccured DESC"
        );
        assert_eq!(
            repaired("SELECT TOP 5 Faultid FROM Faults ORDER BY Faultid", r#"near "5": syntax error"#),
            "SELECT Faultid FROM Faults ORDER BY Faultid LIMIT 5"
        );
    }

    #[test]
    fn functions_are_translated_toward_the_reporting_dialect() {
        assert_eq!(
            repaired("SELECT ISNULL(Datecleared, GETDATE()) FROM Faults", "no such function: ISNULL"),
            "SELECT IFNULL(Datecleared, GETDATE()) FROM Faults"
        );
        assert_eq!(
            repaired("SELECT IFNULL(FixByDate, NOW()) FROM Faults", "'NOW' is not a recognized built-in function name."),
            "SELECT IFNULL(FixByDate, GETDATE()) FROM Faults"
        );
        assert_eq!(
            repaired("SELECT COUNT(*) FROM Faults WHERE Dateoccured < GETDATE()", "no such function: GETDATE"),
            "SELECT COUNT(*) FROM Faults WHERE Dateoccured < DATETIME('now')"
        );
    }

    #[test]
    fn divisors_are_wrapped_in_nullif() {
        let sql = "SELECT SUM(CASE WHEN SLAState = 'I' THEN 1 ELSE 0 END) * 100.0 / COUNT(*), 'a/b', Seriousness / 2 FROM Faults";
        assert_eq!(
            repaired(sql, "Divide by zero error encountered."),
            "SELECT SUM(CASE WHEN SLAState = 'I' THEN 1 ELSE 0 END) * 100.0 / NULLIF(COUNT(*), 0), 'a/b', Seriousness / 2 FROM Faults"
        );
    }

    #[test]
    fn unmapped_names_fall_through_to_later_signatures() {
        let sql = "SELECT Areaint / Total FROM Widgets";
        let classification = analyze(sql, "no such table: Widgets; Divide by zero error encountered");
        assert_eq!(classification.signature.as_deref(), Some("divide_by_zero"));
        assert_eq!(
            classification.repaired_sql.as_deref(),
            Some("SELECT Areaint / NULLIF(Total, 0) FROM Widgets")
        );
    }

    #[test]
    fn unrecognised_errors_are_not_auto_fixable() {
        let classification = analyze("SELECT 1", "database is locked");
        assert!(!classification.matched);
        assert!(classification.repaired_sql.is_none());
        assert!(!analyze("SELECT COUNT(*) FROM Faults", "no such table: Faults").matched);
    }

    #[test]
    fn analysis_is_pure() {
        let sql = "SELECT COUNT(*) FROM tickets";
        let first = analyze(sql, "no such table: tickets");
        let second = analyze(sql, "no such table: tickets");
        assert_eq!(first, second);
        assert_eq!(first.repaired_sql.as_deref(), Some("SELECT COUNT(*) FROM Faults"));
    }
}
