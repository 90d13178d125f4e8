// SPDX-License-Identifier: MIT OR Apache-2.0
//! Extracts metadata from a stub's directive lines.
//!
//! Directive lines start with `:` and declare the stub's interface; all
//! other lines form the stripped GLSL body. Malformed directives are
//! logged and dropped, the rest of the unit still parses. The one fatal
//! outcome is a stub without a `:name` directive.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use glint_graph::ValueKind;

use crate::globals::{global_sampler, global_uniform, GlobalSamplerUsage, GlobalUniformUsage};
use crate::tokenizer::{split_to_words, SourceLine, SubString, Token};

/// The type of a stub parameter, return value or interface variable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    /// No value. Only valid as a return type.
    #[default]
    Void,
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
    /// `image2D`
    Image2D,
    /// An SSBO of `vec4` items.
    Buffer,
}

impl ParamType {
    /// The GLSL spelling of this type.
    pub fn glsl_name(self) -> &'static str {
        match self {
            ParamType::Void => "void",
            ParamType::Float => "float",
            ParamType::Vec2 => "vec2",
            ParamType::Vec3 => "vec3",
            ParamType::Vec4 => "vec4",
            ParamType::Mat4 => "mat4",
            ParamType::Sampler2D => "sampler2D",
            ParamType::Image2D => "image2D",
            ParamType::Buffer => "buffer",
        }
    }

    /// The value kind a parameter of this type reads from the graph, if
    /// it is a plain value parameter.
    pub fn value_kind(self) -> Option<ValueKind> {
        match self {
            ParamType::Float => Some(ValueKind::Float),
            ParamType::Vec2 => Some(ValueKind::Vec2),
            ParamType::Vec3 => Some(ValueKind::Vec3),
            ParamType::Vec4 => Some(ValueKind::Vec4),
            ParamType::Mat4 => Some(ValueKind::Mat4),
            _ => None,
        }
    }
}

fn value_type(word: &SubString<'_>) -> Option<ParamType> {
    match word.token {
        Token::Void => Some(ParamType::Void),
        Token::Float => Some(ParamType::Float),
        Token::Vec2 => Some(ParamType::Vec2),
        Token::Vec3 => Some(ParamType::Vec3),
        Token::Vec4 => Some(ParamType::Vec4),
        Token::Mat4 => Some(ParamType::Mat4),
        Token::Sampler2D => Some(ParamType::Sampler2D),
        Token::Image2D => Some(ParamType::Image2D),
        Token::Buffer => Some(ParamType::Buffer),
        _ => None,
    }
}

/// A `:param` declaration. Becomes a slot on the stub node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubParameter {
    /// Parameter name, also the slot name.
    pub name: String,
    /// Parameter type.
    pub ty: ParamType,
}

/// An `:input` or `:output` declaration, a stage interface variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubVariable {
    /// Variable name.
    pub name: String,
    /// Variable type.
    pub ty: ParamType,
}

/// A validated `:global` reference to a global uniform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalUniformRef {
    /// The global's well-known GLSL name.
    pub name: String,
    /// Table identity.
    pub usage: GlobalUniformUsage,
    /// The global's value type.
    pub ty: ParamType,
}

/// A validated `:global` reference to a global sampler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSamplerRef {
    /// The global's well-known GLSL name.
    pub name: String,
    /// Table identity.
    pub usage: GlobalSamplerUsage,
    /// Whether the sampler is `sampler2DMS`.
    pub multisample: bool,
    /// Whether the sampler is `sampler2DShadow`.
    pub shadow: bool,
}

/// Fatal analysis failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StubError {
    /// The source has no `:name` directive.
    #[error("shader stub has no name")]
    MissingName,
}

/// Everything collected from one stub source unit. Immutable; a source
/// edit produces a whole new metadata record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StubMetadata {
    /// Value of the `:name` directive.
    pub name: String,
    /// Value of the `:returns` directive, `Void` when absent.
    pub return_type: ParamType,
    /// The source with all directive lines removed, order preserved.
    pub stripped_source: String,
    /// Declared parameters in order.
    pub parameters: Vec<StubParameter>,
    /// Validated global uniform references.
    pub global_uniforms: Vec<GlobalUniformRef>,
    /// Validated global sampler references.
    pub global_samplers: Vec<GlobalSamplerRef>,
    /// Declared stage inputs.
    pub inputs: Vec<StubVariable>,
    /// Declared stage outputs.
    pub outputs: Vec<StubVariable>,
}

impl StubMetadata {
    /// Analyzes one stub source unit.
    pub fn from_text(source: &str) -> Result<StubMetadata, StubError> {
        let mut analyzer = Analyzer::default();
        for line in split_to_words(source) {
            analyzer.take_line(&line);
        }
        let Some(name) = analyzer.name else {
            error!("shader stub has no name");
            return Err(StubError::MissingName);
        };
        Ok(StubMetadata {
            name,
            return_type: analyzer.return_type,
            stripped_source: analyzer.stripped_source,
            parameters: analyzer.parameters,
            global_uniforms: analyzer.global_uniforms,
            global_samplers: analyzer.global_samplers,
            inputs: analyzer.inputs,
            outputs: analyzer.outputs,
        })
    }
}

#[derive(Default)]
struct Analyzer {
    name: Option<String>,
    return_type: ParamType,
    stripped_source: String,
    parameters: Vec<StubParameter>,
    global_uniforms: Vec<GlobalUniformRef>,
    global_samplers: Vec<GlobalSamplerRef>,
    inputs: Vec<StubVariable>,
    outputs: Vec<StubVariable>,
}

impl Analyzer {
    fn take_line(&mut self, line: &SourceLine<'_>) {
        if line.words.first().map(|w| w.token) == Some(Token::Colon) {
            self.take_directive(line);
        } else {
            self.stripped_source.push_str(line.entire_line);
            self.stripped_source.push('\n');
        }
    }

    fn take_directive(&mut self, line: &SourceLine<'_>) {
        let Some(keyword) = line.words.get(1) else {
            error!(line = line.line_number, "empty directive");
            return;
        };
        match keyword.token {
            Token::Name => self.take_name(line),
            Token::Returns => self.take_returns(line),
            Token::Param => self.take_param(line),
            Token::Global => self.take_global(line),
            Token::Input => self.take_variable(line, true),
            Token::Output => self.take_variable(line, false),
            _ => {
                error!(
                    line = line.line_number,
                    keyword = keyword.text,
                    "unknown metadata type"
                );
            }
        }
    }

    fn take_name(&mut self, line: &SourceLine<'_>) {
        if line.words.len() != 3 || line.words[2].token != Token::Str {
            error!(
                line = line.line_number,
                "wrong syntax, use ':name \"<name>\"'"
            );
            return;
        }
        self.name = Some(line.words[2].unquoted().to_owned());
    }

    fn take_returns(&mut self, line: &SourceLine<'_>) {
        if line.words.len() != 3 {
            error!(line = line.line_number, "wrong syntax, use ':returns <type>'");
            return;
        }
        match value_type(&line.words[2]) {
            Some(ty) => self.return_type = ty,
            None => {
                error!(
                    line = line.line_number,
                    word = line.words[2].text,
                    "unrecognized return type"
                );
            }
        }
    }

    fn take_param(&mut self, line: &SourceLine<'_>) {
        if line.words.len() < 4 {
            error!(
                line = line.line_number,
                "wrong syntax, use ':param <type> <name>'"
            );
            return;
        }
        let Some(ty) = value_type(&line.words[2]).filter(|ty| *ty != ParamType::Void) else {
            error!(
                line = line.line_number,
                word = line.words[2].text,
                "unrecognized parameter type"
            );
            return;
        };
        self.parameters.push(StubParameter {
            name: line.words[3].text.to_owned(),
            ty,
        });
    }

    fn take_variable(&mut self, line: &SourceLine<'_>, input: bool) {
        if line.words.len() < 4 {
            error!(
                line = line.line_number,
                "wrong syntax, use ':input/:output <type> <name>'"
            );
            return;
        }
        let Some(ty) = value_type(&line.words[2]).filter(|ty| *ty != ParamType::Void) else {
            error!(
                line = line.line_number,
                word = line.words[2].text,
                "unrecognized variable type"
            );
            return;
        };
        let variable = StubVariable {
            name: line.words[3].text.to_owned(),
            ty,
        };
        if input {
            self.inputs.push(variable);
        } else {
            self.outputs.push(variable);
        }
    }

    fn take_global(&mut self, line: &SourceLine<'_>) {
        if line.words.len() < 4 {
            error!(
                line = line.line_number,
                "wrong syntax, use ':global <type> <gName>'"
            );
            return;
        }
        let declared = &line.words[2];
        let name = line.words[3].text;
        if let Some(def) = global_uniform(name) {
            if value_type(declared) != Some(def.ty) {
                error!(
                    line = line.line_number,
                    name, "wrong type for global uniform"
                );
                return;
            }
            self.global_uniforms.push(GlobalUniformRef {
                name: name.to_owned(),
                usage: def.usage,
                ty: def.ty,
            });
            return;
        }
        if let Some(def) = global_sampler(name) {
            let expected = match (def.multisample, def.shadow) {
                (true, _) => Token::Sampler2DMs,
                (_, true) => Token::Sampler2DShadow,
                _ => Token::Sampler2D,
            };
            if declared.token != expected {
                error!(
                    line = line.line_number,
                    name, "wrong type for global sampler"
                );
                return;
            }
            self.global_samplers.push(GlobalSamplerRef {
                name: name.to_owned(),
                usage: def.usage,
                multisample: def.multisample,
                shadow: def.shadow,
            });
            return;
        }
        error!(line = line.line_number, name, "unrecognized global");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_name_is_fatal() {
        let err = StubMetadata::from_text(":returns float\nSHADER { }").unwrap_err();
        assert_eq!(err, StubError::MissingName);
    }

    #[test]
    fn test_name_and_returns() {
        let meta = StubMetadata::from_text(":name \"plasma\"\n:returns vec4\n").unwrap();
        assert_eq!(meta.name, "plasma");
        assert_eq!(meta.return_type, ParamType::Vec4);
    }

    #[test]
    fn test_stripped_source_keeps_non_directive_lines_in_order() {
        let source = ":name \"s\"\nfloat helper() { return 1.0; }\n:param float amount\n\nSHADER { }\n";
        let meta = StubMetadata::from_text(source).unwrap();
        assert_eq!(
            meta.stripped_source,
            "float helper() { return 1.0; }\n\nSHADER { }\n"
        );
        assert!(!meta.stripped_source.contains(":param"));
    }

    #[test]
    fn test_parameters_in_declaration_order() {
        let meta = StubMetadata::from_text(
            ":name \"s\"\n:param float amount\n:param sampler2D source\n:param buffer points\n",
        )
        .unwrap();
        let names: Vec<&str> = meta.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["amount", "source", "points"]);
        assert_eq!(meta.parameters[1].ty, ParamType::Sampler2D);
        assert_eq!(meta.parameters[2].ty, ParamType::Buffer);
    }

    #[test]
    fn test_global_type_checking() {
        let meta =
            StubMetadata::from_text(":name \"s\"\n:global vec3 gSkylightDirection\n").unwrap();
        assert_eq!(meta.global_uniforms.len(), 1);
        assert_eq!(
            meta.global_uniforms[0].usage,
            GlobalUniformUsage::SkylightDirection
        );

        let meta =
            StubMetadata::from_text(":name \"s\"\n:global float gSkylightDirection\n").unwrap();
        assert!(meta.global_uniforms.is_empty());
    }

    #[test]
    fn test_global_sampler_type_checking() {
        let meta =
            StubMetadata::from_text(":name \"s\"\n:global sampler2DMS gGBufferSourceA\n").unwrap();
        assert_eq!(meta.global_samplers.len(), 1);
        assert!(meta.global_samplers[0].multisample);

        let meta =
            StubMetadata::from_text(":name \"s\"\n:global sampler2D gGBufferSourceA\n").unwrap();
        assert!(meta.global_samplers.is_empty());
    }

    #[test]
    fn test_unrecognized_global_is_dropped() {
        let meta = StubMetadata::from_text(":name \"s\"\n:global float gBogus\n").unwrap();
        assert!(meta.global_uniforms.is_empty());
        assert!(meta.global_samplers.is_empty());
    }

    #[test]
    fn test_unknown_directive_does_not_abort_parsing() {
        let meta =
            StubMetadata::from_text(":frobnicate now\n:name \"s\"\n:param float x\n").unwrap();
        assert_eq!(meta.name, "s");
        assert_eq!(meta.parameters.len(), 1);
    }

    #[test]
    fn test_wrong_arity_directives_are_dropped() {
        let meta = StubMetadata::from_text(":name\n:name \"ok\"\n:param float\n:returns\n").unwrap();
        assert_eq!(meta.name, "ok");
        assert!(meta.parameters.is_empty());
        assert_eq!(meta.return_type, ParamType::Void);
    }

    #[test]
    fn test_inputs_and_outputs() {
        let meta = StubMetadata::from_text(
            ":name \"s\"\n:input vec2 texCoord\n:output vec4 GBufferTargetA\n",
        )
        .unwrap();
        assert_eq!(meta.inputs[0].name, "texCoord");
        assert_eq!(meta.inputs[0].ty, ParamType::Vec2);
        assert_eq!(meta.outputs[0].name, "GBufferTargetA");
    }

    #[test]
    fn test_metadata_round_trips_through_json() {
        let meta = StubMetadata::from_text(
            ":name \"s\"\n:returns vec4\n:param float x\n:global float gTime\nSHADER { return vec4(x); }\n",
        )
        .unwrap();
        let json = serde_json::to_string(&meta).unwrap();
        let restored: StubMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, meta);
    }
}
