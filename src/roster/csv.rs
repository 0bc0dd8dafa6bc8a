//! Minimal RFC 4180 reader and writer.
//!
//! Supports quoted fields (with `""` escapes and embedded newlines), CRLF or
//! LF line endings and a UTF-8 byte-order mark. Blank lines are skipped.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct CsvError {
    pub line: usize,
    pub message: &'static str,
}

/// Parse text into records of fields
pub fn parse(text: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_started = false;
    // Set once a quoted field closes; only a delimiter or line end may follow
    let mut quote_closed = false;
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => {
                    in_quotes = false;
                    quote_closed = true;
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        if quote_closed && !matches!(c, ',' | '\n' | '\r') {
            return Err(CsvError {
                line,
                message: "extraneous text after quoted field",
            });
        }
        quote_closed = false;

        match c {
            '"' if !field_started => {
                in_quotes = true;
                field_started = true;
            }
            '"' => {
                return Err(CsvError {
                    line,
                    message: "bare quote in unquoted field",
                });
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_started = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                end_record(&mut records, &mut record, &mut field, field_started);
                field_started = false;
                line += 1;
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
    }

    if in_quotes {
        return Err(CsvError {
            line,
            message: "unterminated quoted field",
        });
    }
    end_record(&mut records, &mut record, &mut field, field_started);

    Ok(records)
}

fn end_record(
    records: &mut Vec<Vec<String>>,
    record: &mut Vec<String>,
    field: &mut String,
    field_started: bool,
) {
    // A line with nothing on it is not a record
    if record.is_empty() && !field_started && field.is_empty() {
        return;
    }
    record.push(std::mem::take(field));
    records.push(std::mem::take(record));
}

/// Serialize records, quoting fields that need it. Lines end with CRLF.
pub fn write<S: AsRef<str>>(records: &[Vec<S>]) -> String {
    let mut out = String::new();
    for record in records {
        let fields: Vec<String> = record.iter().map(|f| escape(f.as_ref())).collect();
        out.push_str(&fields.join(","));
        out.push_str("\r\n");
    }
    out
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let records = parse("ID,First,Last\nA1,Jane,Doe\n").unwrap();
        assert_eq!(records, vec![vec!["ID", "First", "Last"], vec!["A1", "Jane", "Doe"]]);
    }

    #[test]
    fn test_parse_crlf_bom_and_blank_lines() {
        let records = parse("\u{feff}ID,First,Last\r\n\r\nA1,Jane,Doe").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0][0], "ID");
        assert_eq!(records[1], vec!["A1", "Jane", "Doe"]);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let records = parse("A1,\"Doe, Jane\",\"say \"\"hi\"\"\"\nA2,\"multi\nline\",x\n").unwrap();
        assert_eq!(records[0], vec!["A1", "Doe, Jane", "say \"hi\""]);
        assert_eq!(records[1], vec!["A2", "multi\nline", "x"]);
    }

    #[test]
    fn test_parse_empty_trailing_field() {
        let records = parse("a,b,\n").unwrap();
        assert_eq!(records[0], vec!["a", "b", ""]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("a,\"open\n").unwrap_err().message, "unterminated quoted field");
        assert_eq!(parse("a,b\"c\n").unwrap_err().line, 1);
        assert_eq!(
            parse("ok\na,\"open\n").unwrap_err().to_string(),
            "line 3: unterminated quoted field"
        );
    }

    #[test]
    fn test_parse_rejects_text_after_closing_quote() {
        for input in ["\"abc\"def\n", "\"abc\" ,x\n", "x\n\"a\"\"\"b\"c\n"] {
            assert_eq!(
                parse(input).unwrap_err().message,
                "extraneous text after quoted field"
            );
        }
        assert_eq!(parse("\"abc\",x\r\n").unwrap(), vec![vec!["abc", "x"]]);
    }

    #[test]
    fn test_write_quotes_when_needed() {
        let out = write(&[vec!["2024-01-01", "A1", "Doe, Jane", "Monday, 1 Jan 2024, 9:00:00 AM"]]);
        assert_eq!(
            out,
            "2024-01-01,A1,\"Doe, Jane\",\"Monday, 1 Jan 2024, 9:00:00 AM\"\r\n"
        );
    }
}
