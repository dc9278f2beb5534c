use std::error::Error;

use ub_exp::BenchmarkRegistry;

pub fn run() -> Result<(), Box<dyn Error>> {
    let registry = BenchmarkRegistry::with_builtins();
    for name in registry.names() {
        let capability = registry.resolve(name)?;
        println!("{name}\t{}", capability.calculator.accepted_args().join(","));
    }
    Ok(())
}
