// Integration tests harness
mod core {
    include!("core.rs");
}
mod loops {
    include!("loops.rs");
}
mod exception_handling {
    include!("exception_handling.rs");
}
mod suspension {
    include!("suspension.rs");
}
mod closures_and_records {
    include!("closures_and_records.rs");
}
mod analysis {
    include!("analysis.rs");
}
mod compile_errors {
    include!("compile_errors.rs");
}
