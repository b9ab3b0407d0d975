//! The emitter: appends the final symbol-table snapshot fact to the
//! fixpoint's fact store and writes NDJSON.
//!
//! De-duplication itself is `FactStore`'s job (`pykythe_core::vname`); this
//! module's only remaining responsibility is the one fact that depends on
//! the *final* table — `/kythe/x-symtab` — and handing the finished record
//! list to `pykythe_core::output::emit_records`.

use std::io::Write;

use pykythe_core::error::Result;
use pykythe_core::vname::{base64_encode, FactStore, VName, SYMTAB};

use crate::meta::FileContext;
use crate::symtab::SymbolTable;

/// Pretty-print the symbol table as `FQN -> union` lines in canonical FQN
/// order, for the `/kythe/x-symtab` debugging snapshot.
fn format_symtab(symtab: &SymbolTable) -> String {
    let mut out = String::new();
    for (fqn, union) in symtab.iter() {
        out.push_str(fqn);
        out.push_str(" -> [");
        for (i, term) in union.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&term.to_string());
        }
        out.push_str("]\n");
    }
    out
}

/// Stamp the `/kythe/x-symtab` snapshot fact onto `facts` (keyed on the
/// file's own VName, matching how the file's other ambient facts —
/// `/kythe/node/kind`, `/kythe/text` — are addressed) and write every
/// accumulated record as NDJSON to `writer`.
pub fn emit(ctx: &FileContext, facts: &mut FactStore, symtab: &SymbolTable, writer: &mut impl Write) -> Result<()> {
    let file_vname = VName::file(&ctx.corpus, &ctx.root, &ctx.path);
    facts.put_fact(file_vname, SYMTAB, base64_encode(format_symtab(symtab)));
    pykythe_core::output::emit_records(writer, facts.records())
}
