// Property-based tests harness
mod strategies;
mod determinism {
    include!("determinism.rs");
}
mod suspension {
    include!("suspension.rs");
}
mod loops {
    include!("loops.rs");
}
