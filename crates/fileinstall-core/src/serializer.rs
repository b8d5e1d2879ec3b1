//! Serialization of configuration dictionaries for write-back

use crate::resource::Dictionary;
use std::io::Write;

/// Turns a configuration dictionary into bytes.
///
/// The format is swappable; whatever is produced must decode again as a
/// `.cfg.json` file once the generated comment header is skipped.
pub trait ConfigSerializer: Send + Sync {
    fn serialize(&self, dict: &Dictionary, out: &mut dyn Write) -> std::io::Result<()>;
}

/// Pretty-printed JSON with a trailing newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConfigSerializer;

impl ConfigSerializer for JsonConfigSerializer {
    fn serialize(&self, dict: &Dictionary, out: &mut dyn Write) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, dict)?;
        out.write_all(b"\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_pretty_json() {
        let dict = json!({"y": 2, "name": "demo"}).as_object().cloned().unwrap();
        let mut out = Vec::new();

        JsonConfigSerializer.serialize(&dict, &mut out).unwrap();

        insta::assert_snapshot!(String::from_utf8(out).unwrap(), @r###"
        {
          "name": "demo",
          "y": 2
        }
        "###);
    }
}
