use sharpseq_sequencer::{
    generate, run_session, CsvCatalog, FileSink, GeneratorConfig, InputError, MemorySink, ScriptedInput,
    SessionError,
};
use std::io::Write;

const COORDS_M81: [&str; 6] = ["10", "20", "30", "+40", "15", "20"];

fn answers(parts: &[&[&str]]) -> ScriptedInput {
    ScriptedInput::new(parts.iter().flat_map(|p| p.iter().copied()))
}

fn count(text: &str, line: &str) -> usize {
    text.lines().filter(|l| l.trim() == line).count()
}

fn captured(text: &str) -> Vec<u32> {
    text.lines()
        .filter_map(|l| l.trim().strip_prefix("CAPTURE "))
        .map(|rest| rest.split_whitespace().next().unwrap().parse().unwrap())
        .collect()
}

#[test]
fn test_single_broadband_target() {
    let config = GeneratorConfig::default();
    // no start time, cooler off, C6 Hyperstar, UV/IR
    let mut input = answers(&[&["n", "100", "3", "1", "y"], &COORDS_M81, &["M81", "2", "n"]]);
    let mut sink = MemorySink::new();

    let outcome = generate(&mut input, &config, None, &mut sink).unwrap();
    let text = sink.contents().unwrap();

    assert!(text.starts_with("SEQUENCE\n"));
    assert!(text.ends_with("END SEQUENCE\n"));
    assert_eq!(count(text, "MOUNT GOTO \"10 20 30, 40 15 20\""), 1);
    assert_eq!(count(text, "TARGETNAME \"M81\""), 1);
    assert_eq!(captured(text), vec![205]);
    assert!(!text.contains("COOL DOWN"));
    assert!(!text.contains("SET COOLER OFF"));
    assert!(!text.contains("WAIT UNTIL"));
    assert_eq!(outcome.targets.len(), 1);
    assert_eq!(input.remaining(), 0);
}

#[test]
fn test_catalog_miss_falls_back_to_manual_entry() {
    let mut catalog_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(catalog_file, "M42, 5, 35, 17, -5, 23, 28").unwrap();
    let catalog = CsvCatalog::new(catalog_file.path());

    let config = GeneratorConfig::default();
    let mut input = answers(&[
        &["n", "100", "3", "1", "y", "y", "M999"],
        &COORDS_M81,
        &["Mystery", "1", "n"],
    ]);
    let outcome = run_session(&mut input, &config, Some(&catalog)).unwrap();
    let text = outcome.sequence.render();

    assert_eq!(count(&text, "MOUNT GOTO \"10 20 30, 40 15 20\""), 1);
    assert_eq!(count(&text, "TARGETNAME \"Mystery\""), 1);
    assert!(input.notices.iter().any(|n| n.contains("'M999' was not found")));
}

#[test]
fn test_catalog_hit_uses_catalog_coordinates() {
    let mut catalog_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(catalog_file, "# name, ra, dec").unwrap();
    writeln!(catalog_file, "M42, 5, 35, 17, -5, 23, 28").unwrap();
    let catalog = CsvCatalog::new(catalog_file.path());

    let config = GeneratorConfig::default();
    let mut input = answers(&[&["n", "100", "3", "2", "y", "y", "M42", "", "1", "n"]]);
    let outcome = run_session(&mut input, &config, Some(&catalog)).unwrap();
    let text = outcome.sequence.render();

    assert_eq!(count(&text, "MOUNT GOTO \"5 35 17, -5 23 28\""), 1);
    assert_eq!(count(&text, "TARGETNAME \"M42\""), 1);
    assert!(input.notices.iter().any(|n| n.starts_with("Catalog entries:\nM42")));
}

#[test]
fn test_aborted_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aborted.scs");
    let config = GeneratorConfig::default();
    let mut input = answers(&[&["n", "100", "3", "1", "y"], &COORDS_M81, &["M81"]]);
    let mut sink = FileSink::new(&path);

    let err = generate(&mut input, &config, None, &mut sink).unwrap_err();
    assert_eq!(
        err,
        SessionError::Input(InputError::Closed("Enter number of hours to capture data".to_string()))
    );
    assert!(!path.exists());
}

#[test]
fn test_file_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig::default();
    let path = dir.path().join(config.output_path("tonight").file_name().unwrap());
    let mut input = answers(&[&["y", "22", "0", "-10", "1", "3", "y"], &COORDS_M81, &["M81", "1", "n"]]);
    let mut sink = FileSink::new(&path);

    generate(&mut input, &config, None, &mut sink).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();

    assert!(path.to_string_lossy().ends_with("tonight.scs"));
    assert!(text.starts_with("SEQUENCE\n    WAIT UNTIL LOCALTIME \"10:00 PM\"\n"));
    assert_eq!(count(&text, "LOAD PROFILE \"533 HO\""), 1);
    assert_eq!(count(&text, "COOL DOWN TO -10 RATE 8 TOLERANCE 1"), 1);
    assert!(text.ends_with("    MOUNT PARK\n    SET COOLER OFF\nEND SEQUENCE\n"));
}

#[test]
fn test_first_target_allowance() {
    let config = GeneratorConfig::default();
    // Orion 130ST, UV/IR, two 2 hour targets
    let mut input = answers(&[
        &["n", "100", "1", "1", "y"],
        &COORDS_M81,
        &["M81", "2", "y"],
        &COORDS_M81,
        &["M81 again", "2", "n"],
    ]);
    let outcome = run_session(&mut input, &config, None).unwrap();
    assert_eq!(captured(&outcome.sequence.render()), vec![186, 205]);
    assert!(input.questions.iter().any(|q| q == "Enter additional target? (y/n)"));
}

#[test]
fn test_flexure_blocks_reanchor() {
    let config = GeneratorConfig::default();
    // Towa 339, UV/IR, 6 hours
    let mut input = answers(&[&["n", "100", "2", "1", "y"], &COORDS_M81, &["M81", "6", "n"]]);
    let outcome = run_session(&mut input, &config, None).unwrap();
    let text = outcome.sequence.render();

    let blocks = captured(&text);
    assert_eq!(blocks, vec![120, 120, 67]);
    assert_eq!(blocks.iter().sum::<u32>(), 307);
    // two re-anchors plus shutdown
    assert_eq!(count(&text, "MOUNT PARK"), 3);
    assert_eq!(count(&text, "MOUNT GOTO \"10 20 30, 20 15 20\""), 1);
}

#[test]
fn test_filter_wheel_session() {
    let config = GeneratorConfig::default();
    // Carbonstar: filter chosen per target, RGB compound then Ha
    let mut input = answers(&[
        &["n", "-10", "4", "y", "9"],
        &COORDS_M81,
        &["M51", "3", "y", "6"],
        &COORDS_M81,
        &["NGC 7000", "2", "n"],
    ]);
    let outcome = run_session(&mut input, &config, None).unwrap();
    let text = outcome.sequence.render();

    let names: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("TARGETNAME"))
        .collect();
    assert_eq!(
        names,
        vec![
            "TARGETNAME \"M51_R\"",
            "TARGETNAME \"M51_G\"",
            "TARGETNAME \"M51_B\"",
            "TARGETNAME \"NGC 7000_Ha\"",
        ]
    );
    assert_eq!(captured(&text), vec![102, 102, 102, 37]);
    assert_eq!(count(&text, "COOL DOWN TO -10 RATE 25 TOLERANCE 1"), 2);
    assert!(text.ends_with("    MOUNT PARK\n    SET COOLER OFF\n    WHEEL MOVE TO 1\nEND SEQUENCE\n"));
    assert_eq!(input.questions.iter().filter(|q| q.starts_with("Select your filter:")).count(), 2);
}

#[test]
fn test_single_profile_config_skips_telescope_menu() {
    let json = r#"{
        "profiles": [{
            "name": "Backyard refractor",
            "sensor": { "kind": "one_shot_color" },
            "colour_space": "RAW16",
            "cooler_rate": 5,
            "slew_settle_secs": 10,
            "platesolve": { "kind": "single" },
            "filters": [
                { "filter": "uv_ir", "exposure_secs": 60, "platesolve_exposure_secs": 3,
                  "seconds_per_frame": 62.5, "dither_every_frames": 5, "sharpcap_profile": "Refractor OSC" }
            ]
        }]
    }"#;
    let config = GeneratorConfig::from_json(json).unwrap();
    let mut input = answers(&[&["n", "100", "1", "y"], &COORDS_M81, &["M81", "1", "n"]]);
    let outcome = run_session(&mut input, &config, None).unwrap();
    let text = outcome.sequence.render();

    assert!(!input.questions.iter().any(|q| q.starts_with("Select your telescope:")));
    assert_eq!(count(&text, "LOAD PROFILE \"Refractor OSC\""), 1);
    assert_eq!(captured(&text), vec![57]);
    assert_eq!(count(&text, "DELAY 10"), 2);
}

#[test]
fn test_session_without_targets() {
    let config = GeneratorConfig::default();
    let mut input = answers(&[&["n", "100", "3", "1", "n"]]);
    let outcome = run_session(&mut input, &config, None).unwrap();
    assert!(outcome.targets.is_empty());
    assert_eq!(
        outcome.sequence.render(),
        "SEQUENCE\n    DELAY 1\n    MOUNT UNPARK\n    MOUNT UNPARK\n    DELAY 1\n    STILL MODE\n    MOUNT PARK\nEND SEQUENCE\n"
    );
}
