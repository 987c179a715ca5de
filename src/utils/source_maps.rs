use crate::utils::{MusubiError, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

const VLQ_CHARS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// A Source Map v3 document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

#[derive(Debug, Clone, Copy)]
struct Mapping {
    generated_line: u32,
    generated_column: u32,
    source_index: u32,
    original_line: u32,
    original_column: u32,
}

/// Builds a source map incrementally while a bundle is assembled.
/// All line and column numbers are zero-based.
pub struct SourceMapBuilder {
    file: Option<String>,
    sources: Vec<String>,
    sources_content: Vec<String>,
    mappings: Vec<Mapping>,
}

impl SourceMapBuilder {
    pub fn new(file: Option<&str>) -> Self {
        Self {
            file: file.map(|f| f.to_string()),
            sources: Vec::new(),
            sources_content: Vec::new(),
            mappings: Vec::new(),
        }
    }

    /// Register an original source and return its index.
    pub fn add_source(&mut self, name: &str, content: &str) -> u32 {
        self.sources.push(name.to_string());
        self.sources_content.push(content.to_string());
        (self.sources.len() - 1) as u32
    }

    pub fn add_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        source_index: u32,
        original_line: u32,
        original_column: u32,
    ) {
        self.mappings.push(Mapping {
            generated_line,
            generated_column,
            source_index,
            original_line,
            original_column,
        });
    }

    /// Map a whole generated line onto a whole original line.
    pub fn add_line_mapping(&mut self, generated_line: u32, source_index: u32, original_line: u32) {
        self.add_mapping(generated_line, 0, source_index, original_line, 0);
    }

    pub fn build(mut self) -> SourceMap {
        let mappings = encode_mappings(&mut self.mappings);
        SourceMap {
            version: 3,
            file: self.file,
            sources: self.sources,
            sources_content: Some(self.sources_content),
            names: Vec::new(),
            mappings,
        }
    }
}

/// Encode a single value as Base64 VLQ: sign in the low bit, then 5-bit
/// groups from least significant, each with a continuation bit.
fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq: u64 = if value < 0 {
        (((-value) as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = (vlq & 0b11111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(VLQ_CHARS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Encode mappings as semicolon-separated generated lines of
/// comma-separated segments. Within a line the generated column delta
/// resets; source, original line and original column deltas carry across
/// lines.
fn encode_mappings(mappings: &mut [Mapping]) -> String {
    mappings.sort_by_key(|m| (m.generated_line, m.generated_column));

    let mut out = String::new();
    let mut current_line: u32 = 0;
    let mut first_in_line = true;
    let mut prev_gen_col: i64 = 0;
    let mut prev_source: i64 = 0;
    let mut prev_orig_line: i64 = 0;
    let mut prev_orig_col: i64 = 0;

    for mapping in mappings.iter() {
        while current_line < mapping.generated_line {
            out.push(';');
            current_line += 1;
            prev_gen_col = 0;
            first_in_line = true;
        }

        if !first_in_line {
            out.push(',');
        }

        encode_vlq(mapping.generated_column as i64 - prev_gen_col, &mut out);
        encode_vlq(mapping.source_index as i64 - prev_source, &mut out);
        encode_vlq(mapping.original_line as i64 - prev_orig_line, &mut out);
        encode_vlq(mapping.original_column as i64 - prev_orig_col, &mut out);

        prev_gen_col = mapping.generated_column as i64;
        prev_source = mapping.source_index as i64;
        prev_orig_line = mapping.original_line as i64;
        prev_orig_col = mapping.original_column as i64;
        first_in_line = false;
    }

    out
}

/// Helpers for turning a map into bundle footers and `.map` payloads.
pub struct SourceMapUtils;

impl SourceMapUtils {
    pub fn to_json(map: &SourceMap) -> Result<String> {
        serde_json::to_string(map)
            .map_err(|e| MusubiError::build(format!("Failed to serialize source map: {}", e)))
    }

    /// Inline data URL for embedding the map directly in the bundle.
    pub fn to_inline_data_url(map: &SourceMap) -> Result<String> {
        let json = Self::to_json(map)?;
        let encoded = general_purpose::STANDARD.encode(json.as_bytes());
        Ok(format!(
            "data:application/json;charset=utf-8;base64,{}",
            encoded
        ))
    }

    /// Footer comment referencing an external `.map` file.
    pub fn external_comment(map_filename: &str) -> String {
        format!("//# sourceMappingURL={}\n", map_filename)
    }

    /// Footer comment carrying the whole map inline.
    pub fn inline_comment(map: &SourceMap) -> Result<String> {
        Ok(Self::inline_comment_from_json(&Self::to_json(map)?))
    }

    /// Same footer built from an already serialized map.
    pub fn inline_comment_from_json(json: &str) -> String {
        let encoded = general_purpose::STANDARD.encode(json.as_bytes());
        format!(
            "//# sourceMappingURL=data:application/json;charset=utf-8;base64,{}\n",
            encoded
        )
    }
}
