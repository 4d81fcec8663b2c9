//! NEXUS writer for a scored gene tree and its alignment.

use crate::character::{get_symbol_from_state, NucleotideAlignment};
use crate::error::Result;
use crate::model::GeneTree;
use crate::newick::to_newick;
use crate::nexus::defs::{
    BLOCK_BEGIN, BLOCK_END, CHARACTERS, DIMENSIONS, DNA_FORMAT, MATRIX, NCHAR, NEXUS_HEADER,
    NTAX, PAUP, PAUP_JC_SCORE, PAUP_SETTINGS, TAXA, TAXLABELS, TREES, USER_TREE,
};
use crate::parser::utils::escape_label;
use std::io::{self, BufWriter, Write};

// =#========================================================================#=
// NEXUS WRITER
// =#========================================================================#=
/// Writer for a [GeneTree] together with the alignment rows bound to its
/// leaves, in NEXUS format that PAUP* can score directly.
///
/// # Format Structure
/// - `#NEXUS` header
/// - `PAUP` block keeping user branch lengths
/// - `TAXA` block with the labels of all bound rows
/// - `CHARACTERS` block with the active columns as DNA symbols
/// - `TREES` block with the tree as rooted Newick
/// - `PAUP` block requesting the Jukes-Cantor likelihood score
///
/// # Example
/// ```ignore
/// let file = File::create("check.nex")?;
/// NexusWriter::new(file).write_phylogenetic_data(&tree, &alignment)?;
/// ```
pub struct NexusWriter<W: Write> {
    bw: BufWriter<W>,
}

// ============================================================================
// API (public)
// ============================================================================
impl<W: Write> NexusWriter<W> {
    pub fn new(out: W) -> Self {
        NexusWriter {
            bw: BufWriter::new(out),
        }
    }

    /// Writes the complete validation file and flushes it.
    ///
    /// # Errors
    /// - [crate::Error::Io] if writing fails
    /// - [crate::Error::InvalidState] if a stored state has no symbol
    pub fn write_phylogenetic_data(
        &mut self,
        tree: &GeneTree,
        alignment: &NucleotideAlignment,
    ) -> Result<()> {
        self.header()?
            .paup_block(PAUP_SETTINGS)?
            .taxa_block(alignment)?;
        self.characters_block(alignment)?;
        self.trees_block(tree)?
            .paup_block(PAUP_JC_SCORE)?;
        self.bw.flush()?;
        Ok(())
    }

    /// Consumes the writer, returning the underlying sink.
    ///
    /// # Errors
    /// Returns an I/O error if flushing the buffer fails.
    pub fn into_inner(self) -> io::Result<W> {
        self.bw.into_inner().map_err(|e| e.into_error())
    }
}

// ============================================================================
// Nexus Block Writing (private)
// ============================================================================
impl<W: Write> NexusWriter<W> {
    /// Writes "#NEXUS", returning itself for chaining.
    fn header(&mut self) -> io::Result<&mut Self> {
        self.write_all(NEXUS_HEADER)?.newline()?;
        Ok(self)
    }

    /// Writes a PAUP block with one command per line, returning itself for chaining.
    fn paup_block(&mut self, commands: &[&[u8]]) -> io::Result<&mut Self> {
        self.write_all(BLOCK_BEGIN)?.space()?.write_all(PAUP)?.newline()?;
        for command in commands {
            self.tab()?.write_all(command)?.newline()?;
        }
        self.write_all(BLOCK_END)?.newline()?;
        Ok(self)
    }

    /// Writes the TAXA block, returning itself for chaining.
    fn taxa_block(&mut self, alignment: &NucleotideAlignment) -> io::Result<&mut Self> {
        // "Begin taxa;"
        self.write_all(BLOCK_BEGIN)?.space()?.write_all(TAXA)?.newline()?;

        // "\tDimensions ntax=n;"
        self.tab()?
            .write_all(DIMENSIONS)?
            .space()?
            .write_all(NTAX)?
            .equals()?
            .write_all(alignment.num_bound().to_string().as_bytes())?
            .semicolon_ln()?;

        // "\tTaxlabels label ...;"
        self.tab()?.write_all(TAXLABELS)?;
        for (_, row) in alignment.bound_sequences() {
            self.space()?.write_all(escape_label(row.label()).as_bytes())?;
        }
        self.semicolon_ln()?;

        self.write_all(BLOCK_END)?.newline()?;
        Ok(self)
    }

    /// Writes the CHARACTERS block holding the active columns of every bound row.
    fn characters_block(&mut self, alignment: &NucleotideAlignment) -> Result<&mut Self> {
        let num_sites = alignment.num_active_sites();

        self.write_all(BLOCK_BEGIN)?.space()?.write_all(CHARACTERS)?.newline()?;
        self.tab()?
            .write_all(DIMENSIONS)?
            .space()?
            .write_all(NCHAR)?
            .equals()?
            .write_all(num_sites.to_string().as_bytes())?
            .semicolon_ln()?;
        self.tab()?.write_all(DNA_FORMAT)?.newline()?;
        self.tab()?.write_all(MATRIX)?.newline()?;

        let mut symbols = String::with_capacity(num_sites);
        for (_, row) in alignment.bound_sequences() {
            symbols.clear();
            for &state in &row.states()[..num_sites] {
                symbols.push(get_symbol_from_state(state)?);
            }
            self.tab()?.tab()?
                .write_all(escape_label(row.label()).as_bytes())?
                .tab()?
                .write_all(symbols.as_bytes())?
                .newline()?;
        }
        self.tab()?.semicolon_ln()?;

        self.write_all(BLOCK_END)?.newline()?;
        Ok(self)
    }

    /// Writes the TREES block with the single user tree, returning itself for chaining.
    fn trees_block(&mut self, tree: &GeneTree) -> io::Result<&mut Self> {
        self.write_all(BLOCK_BEGIN)?.space()?.write_all(TREES)?.newline()?;
        self.tab()?
            .write_all(USER_TREE)?
            .space()?
            .write_all(to_newick(tree).as_bytes())?
            .newline()?;
        self.write_all(BLOCK_END)?.newline()?;
        Ok(self)
    }
}

// ============================================================================
// Little Helpers (private)
// ============================================================================
impl<W: Write> NexusWriter<W> {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<&mut Self> {
        self.bw.write_all(buf)?;
        Ok(self)
    }

    fn space(&mut self) -> io::Result<&mut Self> {
        self.write_all(b" ")
    }

    fn tab(&mut self) -> io::Result<&mut Self> {
        self.write_all(b"\t")
    }

    fn newline(&mut self) -> io::Result<&mut Self> {
        self.write_all(b"\n")
    }

    fn equals(&mut self) -> io::Result<&mut Self> {
        self.write_all(b"=")
    }

    /// Appends ";\n", returning itself for chaining.
    fn semicolon_ln(&mut self) -> io::Result<&mut Self> {
        self.write_all(b";\n")
    }
}
