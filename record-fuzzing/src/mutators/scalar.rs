// record-fuzzing/src/mutators/scalar.rs
//! Built-in mutators for text, URLs, ids, language tags and integers

use crate::context::FuzzerContext;
use crate::error::FuzzError;
use crate::mutators::{apply_ops, FieldOp, Mutator};
use fake::faker::internet::en::DomainSuffix;
use fake::faker::lorem::en::{Sentence, Word};
use fake::Fake;
use rand::Rng;
use uuid::{Builder, Uuid};

const SPECIAL_CHARS: [&str; 10] = ["\0", "<", ">", "&", "\"", "'", "\u{202E}", "\u{FEFF}", "€", "😀"];
const BLANKS: [&str; 4] = ["", " ", "\t\n", "null"];
const INVALID_ID_CHARS: [char; 8] = ['_', ' ', '!', '/', 'ä', '#', '%', '*'];
const LANGUAGE_TAGS: [&str; 10] = ["de", "de-DE", "de-AT", "de-CH", "en", "en-US", "en-GB", "fr", "fr-FR", "it"];
const BROKEN_SCHEMES: [&str; 5] = ["htp://", "ftp://", "", "http:/", "https:://"];
const INT_BOUNDARIES: [i32; 5] = [0, -1, 1, i32::MIN, i32::MAX];

/// Longest id the record model accepts
const MAX_ID_LEN: usize = 64;

fn random_char(ctx: &mut FuzzerContext) -> String {
    ctx.random().alphanumeric(1)
}

fn char_position(ctx: &mut FuzzerContext, value: &str) -> usize {
    let chars = value.chars().count();
    let index = ctx.random().bounded_index(chars + 1);
    value.char_indices().nth(index).map(|(pos, _)| pos).unwrap_or(value.len())
}

/// Free-text mutator
pub struct StringMutator;

const STRING_OPS: [FieldOp<String>; 6] = [
    replace_chars,
    insert_special,
    truncate,
    repeat,
    blank,
    surround_whitespace,
];

fn replace_chars(ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if ctx.should_fuzz_part() {
            out.push_str(&random_char(ctx));
        } else {
            out.push(c);
        }
    }
    *value = out;
    Ok(())
}

fn insert_special(ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    let special = ctx.random().pick(&SPECIAL_CHARS).copied().unwrap_or("<");
    let position = char_position(ctx, value);
    value.insert_str(position, special);
    Ok(())
}

fn truncate(ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    let keep = ctx.random().bounded_index(value.chars().count());
    *value = value.chars().take(keep).collect();
    Ok(())
}

fn repeat(ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    let times = 2 + ctx.random().bounded_index(4);
    *value = value.repeat(times);
    Ok(())
}

fn blank(ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    *value = ctx.random().pick(&BLANKS).copied().unwrap_or_default().to_string();
    Ok(())
}

fn surround_whitespace(_ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    *value = format!("  {} ", value);
    Ok(())
}

impl Mutator<String> for StringMutator {
    fn name(&self) -> &str {
        "StringMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: String) -> Result<String, FuzzError> {
        apply_ops(ctx, &STRING_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<String, FuzzError> {
        Ok(Sentence(1..4).fake_with_rng(ctx.random().rng_mut()))
    }
}

/// URL mutator: scheme, path segments and stray characters
pub struct UrlMutator;

const URL_OPS: [FieldOp<String>; 4] = [break_scheme, replace_segments, insert_space, append_query];

fn break_scheme(ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    let rest = value
        .split_once("://")
        .map(|(_, rest)| rest.to_string())
        .unwrap_or_else(|| value.clone());
    let scheme = ctx.random().pick(&BROKEN_SCHEMES).copied().unwrap_or_default();
    *value = format!("{}{}", scheme, rest);
    Ok(())
}

fn replace_segments(ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    let (prefix, path) = match value.split_once("://") {
        Some((scheme, path)) => (format!("{}://", scheme), path.to_string()),
        None => (String::new(), value.clone()),
    };
    let mut segments = Vec::new();
    for segment in path.split('/') {
        if ctx.should_fuzz_part() {
            let len = ctx.random().bounded_index(12);
            segments.push(ctx.random().alphanumeric(len));
        } else {
            segments.push(segment.to_string());
        }
    }
    *value = format!("{}{}", prefix, segments.join("/"));
    Ok(())
}

fn insert_space(ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    let position = char_position(ctx, value);
    value.insert(position, ' ');
    Ok(())
}

fn append_query(_ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    value.push_str("?a=<b>&c=%zz");
    Ok(())
}

impl Mutator<String> for UrlMutator {
    fn name(&self) -> &str {
        "UrlMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: String) -> Result<String, FuzzError> {
        apply_ops(ctx, &URL_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<String, FuzzError> {
        let rng = ctx.random().rng_mut();
        let host: String = Word().fake_with_rng(rng);
        let suffix: String = DomainSuffix().fake_with_rng(rng);
        let path: String = Word().fake_with_rng(rng);
        Ok(format!("https://{}.{}/{}", host, suffix, path))
    }
}

/// Id mutator.
///
/// Ids come in three shapes: URL-like, UUIDs and simple tokens. Each shape
/// has its own way of being broken.
pub struct IdMutator;

const SIMPLE_ID_OPS: [FieldOp<String>; 3] = [corrupt_id_chars, overflow_id, empty_id];
const UUID_OPS: [FieldOp<String>; 2] = [regenerate_uuid, corrupt_uuid];

fn random_uuid(ctx: &mut FuzzerContext) -> Uuid {
    Builder::from_random_bytes(ctx.random().rng_mut().gen()).into_uuid()
}

fn corrupt_id_chars(ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if ctx.should_fuzz_part() {
            let replacement = ctx.random().pick(&INVALID_ID_CHARS).copied().unwrap_or('_');
            out.push(replacement);
        } else {
            out.push(c);
        }
    }
    *value = out;
    Ok(())
}

fn overflow_id(ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    let missing = (MAX_ID_LEN + 1).saturating_sub(value.len());
    let extra = ctx.random().bounded_index(8);
    let padding = ctx.random().alphanumeric(missing + extra);
    value.push_str(&padding);
    Ok(())
}

fn empty_id(_ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    value.clear();
    Ok(())
}

fn regenerate_uuid(ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    *value = random_uuid(ctx).to_string();
    Ok(())
}

fn corrupt_uuid(ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    let mut chars: Vec<char> = value.chars().collect();
    if chars.is_empty() {
        return Ok(());
    }
    let index = ctx.random().bounded_index(chars.len());
    chars[index] = if chars[index] == '-' { 'x' } else { 'g' };
    *value = chars.into_iter().collect();
    Ok(())
}

impl Mutator<String> for IdMutator {
    fn name(&self) -> &str {
        "IdMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: String) -> Result<String, FuzzError> {
        if value.starts_with("http") {
            return match value.rsplit_once('/') {
                Some((base, last)) => {
                    let last = apply_ops(ctx, &SIMPLE_ID_OPS, last.to_string())?;
                    Ok(format!("{}/{}", base, last))
                }
                None => UrlMutator.mutate(ctx, value),
            };
        }
        if Uuid::parse_str(&value).is_ok() {
            return apply_ops(ctx, &UUID_OPS, value);
        }
        apply_ops(ctx, &SIMPLE_ID_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<String, FuzzError> {
        Ok(random_uuid(ctx).to_string())
    }
}

/// Language tag mutator
pub struct LanguageCodeMutator;

const LANGUAGE_OPS: [FieldOp<String>; 4] = [swap_case, underscore_separator, other_known_tag, clip_tag];

fn swap_case(_ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    *value = value
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect();
    Ok(())
}

fn underscore_separator(_ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    *value = if value.contains('-') {
        value.replace('-', "_")
    } else {
        format!("{}_{}", value, value.to_uppercase())
    };
    Ok(())
}

fn other_known_tag(ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    let others: Vec<&str> = LANGUAGE_TAGS.iter().copied().filter(|tag| tag != value).collect();
    if let Some(tag) = ctx.random().pick(&others) {
        *value = tag.to_string();
    }
    Ok(())
}

fn clip_tag(_ctx: &mut FuzzerContext, value: &mut String) -> Result<(), FuzzError> {
    *value = value.chars().take(1).collect();
    Ok(())
}

impl Mutator<String> for LanguageCodeMutator {
    fn name(&self) -> &str {
        "LanguageCodeMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: String) -> Result<String, FuzzError> {
        apply_ops(ctx, &LANGUAGE_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<String, FuzzError> {
        Ok(ctx.random().pick(&LANGUAGE_TAGS).copied().unwrap_or("de").to_string())
    }
}

/// Integer mutator
pub struct IntMutator;

const INT_OPS: [FieldOp<i32>; 4] = [other_int, boundary_int, negate_int, off_by_one];

fn other_int(ctx: &mut FuzzerContext, value: &mut i32) -> Result<(), FuzzError> {
    *value = ctx.random().another_i32(*value);
    Ok(())
}

fn boundary_int(ctx: &mut FuzzerContext, value: &mut i32) -> Result<(), FuzzError> {
    *value = ctx.random().pick(&INT_BOUNDARIES).copied().unwrap_or_default();
    Ok(())
}

fn negate_int(_ctx: &mut FuzzerContext, value: &mut i32) -> Result<(), FuzzError> {
    *value = value.wrapping_neg();
    Ok(())
}

fn off_by_one(ctx: &mut FuzzerContext, value: &mut i32) -> Result<(), FuzzError> {
    *value = if ctx.conditional_chance(50.0) {
        value.wrapping_add(1)
    } else {
        value.wrapping_sub(1)
    };
    Ok(())
}

impl Mutator<i32> for IntMutator {
    fn name(&self) -> &str {
        "IntMutator"
    }

    fn mutate(&self, ctx: &mut FuzzerContext, value: i32) -> Result<i32, FuzzError> {
        apply_ops(ctx, &INT_OPS, value)
    }

    fn generate_random(&self, ctx: &mut FuzzerContext) -> Result<i32, FuzzError> {
        Ok(ctx.random().rng_mut().gen_range(-1_000..1_000))
    }
}
