//! Output macros for the hadoopit CLI.
//!
//! Operator-facing results go through these macros so every crate prints
//! with the same markers. Diagnostic logging goes through `tracing` instead.

#[macro_export]
macro_rules! hit_println {
    () => {
        println!();
    };
    ($($arg:tt)*) => {
        println!("{}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! hit_error {
    ($($arg:tt)*) => {
        eprintln!("❌ {}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! hit_error_with_details {
    ($main:expr, $details:expr) => {
        eprintln!("❌ {}", $main);
        for detail in $details {
            eprintln!("   └─ {}", detail);
        }
    };
}

#[macro_export]
macro_rules! hit_error_hint {
    ($($arg:tt)*) => {
        eprintln!("💡 {}", format!($($arg)*));
    };
}

#[macro_export]
macro_rules! hit_success {
    ($($arg:tt)*) => {
        println!("✓ {}", format!($($arg)*));
    };
}

#[macro_export]
macro_rules! hit_info {
    ($($arg:tt)*) => {
        println!("ℹ {}", format!($($arg)*));
    };
}

#[macro_export]
macro_rules! hit_warning {
    ($($arg:tt)*) => {
        eprintln!("⚠ {}", format!($($arg)*));
    };
}
