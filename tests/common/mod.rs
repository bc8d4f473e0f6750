/// Run the whole pipeline down to the CPS IR
pub fn run_pipeline(src: &str) -> nanoc::ir::Program {
    nanoc::compile(src).unwrap()
}

/// Run the front half only: parse, desugar, normalize, resolve, check.
/// Loop-heavy programs stop here; the CPS IR cannot express loops.
pub fn analyze(src: &str) {
    let _ = nanoc::analyze(src).unwrap();
}
