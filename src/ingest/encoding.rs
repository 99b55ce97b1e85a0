// src/ingest/encoding.rs

use anyhow::{bail, Result};
use encoding_rs::Encoding;
use tracing::debug;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Decode CSV bytes, attempting each candidate encoding in a fixed order:
/// GBK, UTF-8, GB2312, UTF-8 with signature. The first decode with no
/// malformed sequences wins. Screener exports are usually GBK.
pub fn decode_text(bytes: &[u8]) -> Result<String> {
    if let Some(text) = try_label(b"gbk", bytes) {
        return Ok(text);
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        debug!("decoded as utf-8");
        return Ok(text.to_string());
    }
    if let Some(text) = try_label(b"gb2312", bytes) {
        return Ok(text);
    }
    if let Some(stripped) = bytes.strip_prefix(&UTF8_BOM) {
        if let Ok(text) = std::str::from_utf8(stripped) {
            debug!("decoded as utf-8-sig");
            return Ok(text.to_string());
        }
    }
    bail!("no candidate encoding decodes the input cleanly")
}

fn try_label(label: &[u8], bytes: &[u8]) -> Option<String> {
    let enc = Encoding::for_label(label)?;
    let text = enc.decode_without_bom_handling_and_without_replacement(bytes)?;
    debug!(encoding = enc.name(), "decoded");
    Some(text.into_owned())
}
