//! `klass list`: print the conformance case names.

use crate::conformance;

pub fn execute() -> anyhow::Result<()> {
    let cases = conformance::cases();
    let width = cases.iter().map(|c| c.name.len()).max().unwrap_or(0);
    for case in &cases {
        println!("{:width$}  {}", case.name, case.description, width = width);
    }
    Ok(())
}
