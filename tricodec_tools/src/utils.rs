use std::{io::Write, path::Path};

use text_io::read;

#[derive(Debug, Clone, Copy)]
pub enum Assume {
    Yes,
    No,
}

/// Human readable size with binary units, e.g. `1.50 KB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{bytes} B")
    }

    let mut size = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if size < 1024.0 {
            break
        }
        size /= 1024.0;
        unit = next;
    }

    format!("{size:.2} {unit}")
}

pub fn exists_decision<P: AsRef<Path>>(place: &str, action: &str, path: &P, assume: Option<Assume>) -> bool {
    let path = path.as_ref();

    match assume {
        Some(Assume::Yes) => return true,
        Some(Assume::No) => return false,
        None => (),
    }

    loop {
        print!("{place} file {path:?} already exists. {action}? [y/N] ");
        let _ = std::io::stdout().flush();

        let opt: String = read!("{}\n");
        match opt.trim().to_lowercase().as_str() {
            "y" | "yes" => return true,
            "" | "n" | "no" => return false,
            _ => continue,
        }
    }
}
