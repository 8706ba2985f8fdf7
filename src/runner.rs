//! The case runner: the three-phase validation protocol.
//!
//! Per case: (1) compile the source, (2) check semantic-map completeness
//! against the identifier lister's ground truth, (3) rename every
//! occurrence in turn and recompile the rewritten source. Phase 1 failure
//! ends the case; a phase 2 completeness violation is reported but the case
//! continues; the first phase 3 failure aborts the remaining occurrences.
//! No failure aborts the run.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;

use crate::cases::TestCase;
use crate::error::{CaseError, ToolError};
use crate::render::{self, MAGENTA, RESET};
use crate::report::{CaseReport, FailStage};
use crate::smap::{smap_covers, IdentOccurrence};
use crate::toolchain::Tools;

/// The fixed substitute identifier every occurrence is renamed to.
pub const RENAME_SUBSTITUTE: &str = "RenamedIdent123";

fn flush_stdout() {
    io::stdout().flush().ok();
}

/// Best-effort source bytes for diagnostics.
fn source_bytes(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap_or_else(|err| {
        warn!(path = %path.display(), %err, "could not read source for diagnostics");
        Vec::new()
    })
}

/// Run the full protocol for one case.
pub fn run_case<T: Tools>(tools: &T, case: &TestCase) -> CaseReport {
    println!("{MAGENTA}Processing {}...{RESET}", case.name);

    // 1. Source check: the case must compile as-is.
    print!("Initial source code check... ");
    flush_stdout();
    match tools.check_source(&case.source) {
        Ok(out) if out.success => println!("{}", render::pass()),
        Ok(out) => {
            println!("{}", render::fail());
            if !out.stderr.is_empty() {
                print!("{}", out.stderr);
            }
            return CaseReport::fail(FailStage::SourceCheck);
        }
        Err(err) => {
            println!("{}", render::fail());
            warn!(case = %case.name, %err, "source check could not run");
            return CaseReport::fail(FailStage::SourceCheck);
        }
    }

    // 2. Semantic map completeness. A violation is reported and the case
    // continues; a collaborator error here is terminal for the case.
    print!("Checking semantic map completeness... ");
    flush_stdout();
    let (idents, violation) = match check_smap(tools, case) {
        Ok(result) => result,
        Err(err) => {
            println!("{}", render::fail());
            warn!(case = %case.name, %err, "semantic map check could not run");
            return CaseReport::fail(FailStage::SmapCheck);
        }
    };

    // 3. Rename every occurrence and recompile.
    print!("Renaming check... ");
    flush_stdout();
    match check_renames(tools, case, &idents) {
        Ok(()) => {
            println!("{}", render::pass());
            CaseReport::pass().with_violation(violation)
        }
        Err(err) => {
            // Rename and post-rename failures print their FAIL marker with
            // diagnostics attached; hard tool errors have not yet.
            if matches!(err, CaseError::Tool(_)) {
                println!("{}", render::fail());
            }
            warn!(case = %case.name, %err, "renaming check failed");
            CaseReport::fail(FailStage::RenameCheck).with_violation(violation)
        }
    }
}

/// Phase 2: run both collaborators, parse, and compare.
///
/// Returns the ground-truth occurrences (phase 3 input) and whether a
/// completeness violation was detected and reported.
fn check_smap<T: Tools>(
    tools: &T,
    case: &TestCase,
) -> Result<(Vec<IdentOccurrence>, bool), ToolError> {
    let smap = tools.semantic_map(&case.source)?;
    let idents = tools.list_idents(&case.source)?;

    if smap_covers(&idents, &smap) {
        println!("{}", render::pass());
        return Ok((idents, false));
    }

    println!("{}", render::fail());
    println!("{}", render::rule());
    print!("{}", render::render_smap(&source_bytes(&case.source), &smap));
    println!("{}", render::rule());
    Ok((idents, true))
}

/// Phase 3: rename each occurrence in lister order, recompiling after each.
///
/// The rewritten source goes to one scratch artifact per case, fully
/// rewritten each iteration before the compiler reads it. The first failure
/// aborts the remaining occurrences.
fn check_renames<T: Tools>(
    tools: &T,
    case: &TestCase,
    idents: &[IdentOccurrence],
) -> Result<(), CaseError> {
    if idents.is_empty() {
        return Ok(());
    }

    let artifact = NamedTempFile::with_suffix(".go").map_err(ToolError::Io)?;

    for (n, ident) in idents.iter().enumerate() {
        print!("{}%... ", n * 100 / idents.len());
        flush_stdout();

        let renamed = tools.rename(&case.source, ident.offset, RENAME_SUBSTITUTE)?;
        if !renamed.success {
            println!("{}", render::fail());
            print!("{}{}", renamed.stdout, renamed.stderr);
            show_cursor(case, ident.offset);
            return Err(CaseError::RenameFailure {
                offset: ident.offset,
            });
        }

        fs::write(artifact.path(), renamed.stdout.as_bytes()).map_err(ToolError::Io)?;

        let compiled = tools.check_source(artifact.path()).map_err(CaseError::Tool)?;
        if !compiled.success {
            println!("{}", render::fail());
            show_cursor(case, ident.offset);
            print!("{}", renamed.stdout);
            println!("{}", render::rule());
            return Err(CaseError::PostRenameCompileFailure {
                offset: ident.offset,
            });
        }

        // Wipe the progress counter before the next iteration.
        print!("\r{}\rRenaming check... ", " ".repeat(72));
    }

    Ok(())
}

/// Cursor-position diagnostic, framed by rules.
fn show_cursor(case: &TestCase, offset: usize) {
    println!("{}", render::rule());
    print!("{}", render::render_cursor(&source_bytes(&case.source), offset));
    println!("{}", render::rule());
}
