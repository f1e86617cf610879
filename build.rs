use time::format_description;
use time::OffsetDateTime;

/// Stamp `var` with `now` in `pattern`, unless the environment already pins it.
fn stamp(var: &str, now: OffsetDateTime, pattern: &str) {
    println!("cargo:rerun-if-env-changed={var}");
    let value = std::env::var(var).unwrap_or_else(|_| {
        format_description::parse(pattern)
            .ok()
            .and_then(|items| now.format(&items).ok())
            .unwrap_or_else(|| "unknown".to_string())
    });
    println!("cargo:rustc-env={var}={value}");
}

fn main() {
    let now = OffsetDateTime::now_utc();
    stamp("KENOS_BUILD_DATE", now, "[year]-[month]-[day]");
    stamp("KENOS_BUILD_TIME", now, "[hour]:[minute] UTC");
}
