use anyhow::Context;
use serialno::{Clock, CounterStore, NewFormat, SerialService, SleepProvider};
use std::{fs, path::Path};
use tracing::{debug, info};

/// Creates the formats listed in the JSON file at `path`.
///
/// The file holds an array of `NewFormat` objects. Keys that already exist are
/// skipped, so seeding on every start is safe. Returns the number created.
pub fn seed_formats<S, C, P>(service: &SerialService<S, C, P>, path: &Path) -> anyhow::Result<usize>
where
    S: CounterStore,
    C: Clock,
    P: SleepProvider,
{
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed formats from {}", path.display()))?;
    let formats: Vec<NewFormat> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse seed formats in {}", path.display()))?;

    let mut created = 0;
    for format in formats {
        match service.format_by_key(format.key.trim()) {
            Ok(existing) => {
                debug!(key = %existing.key, "seed format already present, skipping");
            }
            Err(err) if err.is_not_found() => {
                service
                    .create_format(format)
                    .context("failed to create seed format")?;
                created += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    info!(created, path = %path.display(), "seed formats applied");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialno::{GeneratorConfig, MemoryStore};
    use std::io::Write;

    fn seed_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn seeds_once() {
        let service = SerialService::new(MemoryStore::new(), GeneratorConfig::default());
        let file = seed_file(
            r#"[
                { "key": "inv", "name": "Invoices", "pattern": "INV-{NUMBER:5}", "currentNumber": 100 },
                { "key": "memo", "name": "Memos", "pattern": "M-{NUMBER:3}", "isActive": false }
            ]"#,
        );

        assert_eq!(seed_formats(&service, file.path()).unwrap(), 2);
        assert_eq!(seed_formats(&service, file.path()).unwrap(), 0);

        let inv = service.format_by_key("inv").unwrap();
        assert_eq!(inv.current_number, 100);
        assert!(inv.is_active);
        assert!(!service.format_by_key("memo").unwrap().is_active);
    }

    #[test]
    fn existing_counters_are_kept() {
        let service = SerialService::new(MemoryStore::new(), GeneratorConfig::default());
        let file = seed_file(r#"[{ "key": "inv", "name": "Invoices", "pattern": "INV-{NUMBER:5}" }]"#);
        seed_formats(&service, file.path()).unwrap();

        service.generate("inv", &serialno::AcceptAll).unwrap();
        seed_formats(&service, file.path()).unwrap();
        assert_eq!(service.counter("inv").unwrap(), 1);
    }

    #[test]
    fn rejects_bad_files() {
        let service = SerialService::new(MemoryStore::new(), GeneratorConfig::default());

        let garbage = seed_file("{ not json");
        assert!(seed_formats(&service, garbage.path()).is_err());

        let invalid = seed_file(r#"[{ "key": " ", "name": "Blank", "pattern": "X" }]"#);
        assert!(seed_formats(&service, invalid.path()).is_err());

        assert!(seed_formats(&service, Path::new("/nonexistent/seed.json")).is_err());
    }
}
