//! NDJSON emission for Kythe facts and edges.
//!
//! All process output funnels through [`emit_records`] rather than
//! scattering `println!` calls across the codebase.

use std::io::Write;

use crate::error::Result;
use crate::vname::Record;

/// Write each record as one line of JSON to `writer`, in the order given.
/// Callers are responsible for supplying records in deterministic order
/// (source order, then canonical-FQN order for synthesized entries).
pub fn emit_records<W: Write>(writer: &mut W, records: &[Record]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut *writer, record)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vname::{base64_encode, VName};

    #[test]
    fn emits_one_json_object_per_line() {
        let records = vec![Record::Fact {
            source: VName::node("c", "r", "python", "mod.x"),
            fact_name: "/kythe/node/kind".to_string(),
            fact_value: base64_encode("variable"),
        }];
        let mut buf = Vec::new();
        emit_records(&mut buf, &records).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.trim_end().ends_with('}'));
    }
}
