//! Per-locale string tables.
//!
//! Each locale lives in a `<code>.lproj/` directory at the archive root. Its
//! `pass.strings` file maps the English strings used in `pass.json` to their
//! translations, one `"key" = "value";` pair per line.

use crate::{Error, Result};

/// Directory extension marking a localization.
pub const EXTENSION: &str = "lproj";

/// File name of the string table inside a localization directory.
pub const STRINGS_FILE: &str = "pass.strings";

/// One translated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedKey {
    pub key: String,
    pub value: String,
}

impl LocalizedKey {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The string table of one locale.
///
/// # Examples
///
/// ```
/// use pkpass::Localization;
///
/// let fr = Localization::new("fr")
///     .key("Gate", "Porte")
///     .key("Seat", "Siège");
/// let table = fr.to_strings();
/// assert!(table.starts_with("\"Gate\" = \"Porte\";\n"));
///
/// let parsed = Localization::from_strings("fr", table.as_bytes())?;
/// assert_eq!(parsed, fr);
/// # Ok::<(), pkpass::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localization {
    /// Locale code, e.g. `en`, `zh-Hans` or `pt_BR`.
    pub code: String,
    pub keys: Vec<LocalizedKey>,
}

impl Localization {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            keys: Vec::new(),
        }
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.keys.push(LocalizedKey::new(key, value));
        self
    }

    /// Looks up the translation of `key`. Later duplicates win.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.keys
            .iter()
            .rev()
            .find(|k| k.key == key)
            .map(|k| k.value.as_str())
    }

    /// `<code>.lproj`
    pub fn directory(code: &str) -> String {
        format!("{code}.{EXTENSION}")
    }

    /// `<code>.lproj/pass.strings`
    pub fn strings_path(code: &str) -> String {
        format!("{}/{STRINGS_FILE}", Self::directory(code))
    }

    /// Encodes the table as UTF-8 `.strings` text.
    pub fn to_strings(&self) -> String {
        let mut out = String::new();
        for entry in &self.keys {
            out.push('"');
            escape_into(&mut out, &entry.key);
            out.push_str("\" = \"");
            escape_into(&mut out, &entry.value);
            out.push_str("\";\n");
        }
        out
    }

    /// Decodes a `.strings` table for `code`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidEntryPath`] if `code` is not a valid locale code
    /// - [`Error::RecordDecode`] with a `<file>:<line>` path on a syntax error
    pub fn from_strings(code: &str, data: &[u8]) -> Result<Self> {
        validate_locale_code(code)?;
        let keys = parse_strings(&Self::strings_path(code), data)?;
        Ok(Self {
            code: code.to_string(),
            keys,
        })
    }
}

/// Checks that `code` can be used as a directory name inside the archive.
pub fn validate_locale_code(code: &str) -> Result<()> {
    if code.is_empty() || code.contains('/') || code.contains('\\') || code.contains("..") {
        return Err(Error::InvalidEntryPath(Localization::directory(code)));
    }
    Ok(())
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
}

/// Parses `.strings` text into its pairs, in file order.
///
/// `data` may be UTF-8 (with or without BOM) or UTF-16 with a BOM. Blank
/// lines, `//` line comments and `/* */` block comments are skipped.
/// `source` only names the table in error paths.
pub fn parse_strings(source: &str, data: &[u8]) -> Result<Vec<LocalizedKey>> {
    let text = decode_text(source, data)?;
    let mut parser = StringsParser {
        source,
        chars: text.chars().collect(),
        pos: 0,
        line: 1,
    };
    parser.parse()
}

fn decode_text(source: &str, data: &[u8]) -> Result<String> {
    let utf16 = |bytes: &[u8], from: fn([u8; 2]) -> u16| {
        let units: Vec<u16> = bytes
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => from([*a, *b]),
                _ => 0xFFFD,
            })
            .collect();
        String::from_utf16(&units).map_err(|e| decode_error(source, 1, e.to_string()))
    };

    match data {
        [0xFF, 0xFE, rest @ ..] => utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => std::str::from_utf8(rest)
            .map(str::to_string)
            .map_err(|e| decode_error(source, 1, e.to_string())),
        _ => std::str::from_utf8(data)
            .map(str::to_string)
            .map_err(|e| decode_error(source, 1, e.to_string())),
    }
}

fn decode_error(source: &str, line: usize, message: String) -> Error {
    Error::RecordDecode {
        path: format!("{source}:{line}"),
        message,
    }
}

struct StringsParser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl StringsParser<'_> {
    fn parse(&mut self) -> Result<Vec<LocalizedKey>> {
        let mut keys = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek().is_none() {
                break;
            }
            let key = self.quoted()?;
            self.skip_trivia()?;
            self.expect('=')?;
            self.skip_trivia()?;
            let value = self.quoted()?;
            self.skip_trivia()?;
            self.expect(';')?;
            keys.push(LocalizedKey { key, value });
        }
        Ok(keys)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        decode_error(self.source, self.line, message.into())
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.line;
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => {
                                return Err(decode_error(
                                    self.source,
                                    start,
                                    "unterminated block comment".into(),
                                ))
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected {expected:?}, found {c:?}"))),
            None => Err(self.error(format!("expected {expected:?}, found end of file"))),
        }
    }

    fn quoted(&mut self) -> Result<String> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => out.push(self.escape()?),
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn escape(&mut self) -> Result<char> {
        match self.bump() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some(c @ ('"' | '\\' | '\'')) => Ok(c),
            Some('U' | 'u') => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let digit = self
                        .bump()
                        .and_then(|c| c.to_digit(16))
                        .ok_or_else(|| self.error("\\U escape needs four hex digits"))?;
                    code = code * 16 + digit;
                }
                char::from_u32(code)
                    .ok_or_else(|| self.error(format!("\\U{code:04X} is not a scalar value")))
            }
            Some(c) => Err(self.error(format!("unknown escape \\{c}"))),
            None => Err(self.error("unterminated string")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(Localization::directory("en"), "en.lproj");
        assert_eq!(Localization::strings_path("zh-Hans"), "zh-Hans.lproj/pass.strings");
    }

    #[test]
    fn test_encode_escapes() {
        let table = Localization::new("en")
            .key("say \"hi\"", "back\\slash")
            .key("multi", "line\nbreak")
            .to_strings();
        assert_eq!(
            table,
            "\"say \\\"hi\\\"\" = \"back\\\\slash\";\n\"multi\" = \"line\\nbreak\";\n"
        );
    }

    #[test]
    fn test_parse_with_comments() {
        let text = concat!(
            "/* Gate\n   label */\n",
            "\"Gate\" = \"Porte\";\n\n",
            "// seat\n",
            "\"Seat\"=\"Siège\" ;\n",
        );
        let keys = parse_strings("fr.lproj/pass.strings", text.as_bytes()).unwrap();
        assert_eq!(
            keys,
            [LocalizedKey::new("Gate", "Porte"), LocalizedKey::new("Seat", "Siège")]
        );
    }

    #[test]
    fn test_parse_utf16() {
        let text = "\"Gate\" = \"Tor\";";
        let mut le = vec![0xFF, 0xFE];
        le.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        let mut be = vec![0xFE, 0xFF];
        be.extend(text.encode_utf16().flat_map(u16::to_be_bytes));

        for data in [le, be] {
            let keys = parse_strings("de", &data).unwrap();
            assert_eq!(keys, [LocalizedKey::new("Gate", "Tor")]);
        }
    }

    #[test]
    fn test_parse_unicode_escape() {
        let keys = parse_strings("ja", br#""Yen" = "\U00A5";"#).unwrap();
        assert_eq!(keys[0].value, "\u{a5}");
    }

    #[test]
    fn test_parse_error_reports_line() {
        let data = b"\"a\" = \"b\";\n\"c\" \"d\";\n";
        let err = parse_strings("en.lproj/pass.strings", data).unwrap_err();
        match err {
            Error::RecordDecode { path, .. } => assert_eq!(path, "en.lproj/pass.strings:2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_get_prefers_last() {
        let table = Localization::new("en").key("a", "1").key("a", "2");
        assert_eq!(table.get("a"), Some("2"));
        assert_eq!(table.get("b"), None);
    }

    #[test]
    fn test_locale_code_validation() {
        assert!(validate_locale_code("pt_BR").is_ok());
        assert!(validate_locale_code("").is_err());
        assert!(validate_locale_code("../x").is_err());
        assert!(validate_locale_code("a/b").is_err());
    }
}
