// SPDX-License-Identifier: MIT OR Apache-2.0
//! Splits stub source text into lines of classified words.
//!
//! The vocabulary is fixed: GLSL-ish type names, the directive keywords,
//! a handful of punctuation tokens, quoted strings and `//` comments.
//! Words outside the vocabulary tokenize as [`Token::Unknown`], which is
//! not an error by itself; the analyzer decides whether an unknown word
//! is acceptable in its position.

use tracing::error;

/// Classification of one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A word outside the fixed vocabulary.
    Unknown,
    /// A `//` comment running to the end of the line.
    CommentLine,
    /// The `//!` marker. Reserved, currently unused by the analyzer.
    Metadata,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `=`
    Equals,
    /// A `"`-quoted string, quotes included in the text.
    Str,
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `mat4`
    Mat4,
    /// `sampler2D`
    Sampler2D,
    /// `sampler2DMS`
    Sampler2DMs,
    /// `sampler2DShadow`
    Sampler2DShadow,
    /// `image2D`
    Image2D,
    /// `buffer`
    Buffer,
    /// `void`
    Void,
    /// `name`
    Name,
    /// `returns`
    Returns,
    /// `param`
    Param,
    /// `global`
    Global,
    /// `input`
    Input,
    /// `output`
    Output,
}

fn keyword_token(word: &str) -> Token {
    match word {
        "float" => Token::Float,
        "vec2" => Token::Vec2,
        "vec3" => Token::Vec3,
        "vec4" => Token::Vec4,
        "mat4" => Token::Mat4,
        "sampler2D" => Token::Sampler2D,
        "sampler2DMS" => Token::Sampler2DMs,
        "sampler2DShadow" => Token::Sampler2DShadow,
        "image2D" => Token::Image2D,
        "buffer" => Token::Buffer,
        "void" => Token::Void,
        "name" => Token::Name,
        "returns" => Token::Returns,
        "param" => Token::Param,
        "global" => Token::Global,
        "input" => Token::Input,
        "output" => Token::Output,
        _ => Token::Unknown,
    }
}

/// One classified word, borrowing the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubString<'a> {
    /// The word's classification.
    pub token: Token,
    /// The word's text, quotes included for [`Token::Str`].
    pub text: &'a str,
}

impl<'a> SubString<'a> {
    /// The text with surrounding quotes removed. Non-string words are
    /// returned as-is.
    pub fn unquoted(&self) -> &'a str {
        if self.token == Token::Str {
            self.text
                .strip_prefix('"')
                .map(|t| t.strip_suffix('"').unwrap_or(t))
                .unwrap_or(self.text)
        } else {
            self.text
        }
    }
}

/// One physical source line with its words. Blank lines carry an empty
/// word list so callers can reconstruct line structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// 1-based line number.
    pub line_number: usize,
    /// The whole line, untrimmed, without its terminator.
    pub entire_line: &'a str,
    /// The line's words in order.
    pub words: Vec<SubString<'a>>,
}

/// Tokenizes source text into one [`SourceLine`] per physical line.
///
/// Malformed quoting logs an error and the unterminated string runs to
/// the end of its line; tokenization never fails.
pub fn split_to_words(source: &str) -> Vec<SourceLine<'_>> {
    source
        .lines()
        .enumerate()
        .map(|(index, line)| {
            let line_number = index + 1;
            SourceLine {
                line_number,
                entire_line: line,
                words: split_line(line, line_number),
            }
        })
        .collect()
}

fn split_line(line: &str, line_number: usize) -> Vec<SubString<'_>> {
    let bytes = line.as_bytes();
    let mut words = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        if bytes[i] == b'"' {
            let start = i;
            i += 1;
            let mut terminated = false;
            while i < bytes.len() {
                match bytes[i] {
                    b'\\' if i + 1 < bytes.len() => i += 2,
                    b'"' => {
                        i += 1;
                        terminated = true;
                        break;
                    }
                    _ => i += 1,
                }
            }
            if !terminated {
                error!(line = line_number, "unterminated quote");
            }
            words.push(SubString {
                token: Token::Str,
                text: &line[start..i],
            });
            continue;
        }
        if line[i..].starts_with("//!") {
            words.push(SubString {
                token: Token::Metadata,
                text: &line[i..i + 3],
            });
            i += 3;
            continue;
        }
        if line[i..].starts_with("//") {
            words.push(SubString {
                token: Token::CommentLine,
                text: &line[i..],
            });
            break;
        }
        let single = match bytes[i] {
            b';' => Some(Token::Semicolon),
            b':' => Some(Token::Colon),
            b'=' => Some(Token::Equals),
            // a lone slash, the comment cases are handled above
            b'/' => Some(Token::Unknown),
            _ => None,
        };
        if let Some(token) = single {
            words.push(SubString {
                token,
                text: &line[i..i + 1],
            });
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && !is_delimiter(bytes[i]) {
            i += 1;
        }
        let text = &line[start..i];
        words.push(SubString {
            token: keyword_token(text),
            text,
        });
    }
    words
}

fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'"' | b'/' | b';' | b':' | b'=')
}
