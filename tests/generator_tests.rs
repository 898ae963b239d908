mod common;

use std::{fs, path::Path};

use common::*;
use sermap::prelude::*;

fn settings(csv: &Path, shapefile: Option<&Path>, output: &Path) -> Settings {
    Settings {
        csv_path: csv.to_path_buf(),
        shapefile_path: shapefile.map(Path::to_path_buf),
        output_path: output.to_path_buf(),
        ..Settings::default()
    }
}

#[test]
fn azul_row_without_shapefile() {
    let dir = tmp();
    let csv = write_csv(dir.path(), &["1;Azul;12;Calle Mayor;"]);
    let output = dir.path().join("index.html");

    let summary = Generator::new(settings(&csv, None, &output)).run().unwrap();
    assert_eq!(summary.segments, 1);
    assert_eq!(summary.spots, 12);
    assert_eq!(summary.without_geometry, 1);

    let payload = embedded_payload(&fs::read_to_string(&output).unwrap());
    let azul = zone(&payload, "azul");
    let segments = azul["segments"].as_array().unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0]["id"], "1");
    assert_eq!(segments[0]["spots"], 12);
    assert_eq!(segments[0]["street"], "Calle Mayor");
    assert!(segments[0]["coords"].as_array().unwrap().is_empty());
    assert!(segments[0]["centroid"].is_null());
    for key in ["verde", "naranja", "rojo", "alta_rotacion"] {
        assert!(zone(&payload, key)["segments"].as_array().unwrap().is_empty());
    }
}

#[test]
fn every_valid_row_lands_in_its_zone() {
    let dir = tmp();
    let csv = write_csv(
        dir.path(),
        &[
            "1;Verde;4;Calle A;",
            "2;Azul;6;Calle B;",
            "3;Naranja;8;Calle C;",
            "4;Rojo;2;Calle D;",
            "5;Alta Rotación;10;Calle E;",
            "6;Azul;1;Calle F;",
        ],
    );
    let output = dir.path().join("index.html");
    Generator::new(settings(&csv, None, &output)).run().unwrap();

    let payload = embedded_payload(&fs::read_to_string(&output).unwrap());
    let ids = |key: &str| -> Vec<String> {
        zone(&payload, key)["segments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap().to_string())
            .collect()
    };
    assert_eq!(ids("verde"), ["1"]);
    assert_eq!(ids("azul"), ["2", "6"]);
    assert_eq!(ids("naranja"), ["3"]);
    assert_eq!(ids("rojo"), ["4"]);
    assert_eq!(ids("alta_rotacion"), ["5"]);

    let keys: Vec<_> = payload["zones"]
        .as_array()
        .unwrap()
        .iter()
        .map(|z| z["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, ["verde", "azul", "naranja", "rojo", "alta_rotacion"]);
}

#[test]
fn invalid_rows_are_skipped_and_spots_add_up() {
    let dir = tmp();
    let csv = write_csv(
        dir.path(),
        &[
            "1;Azul;12;Calle Mayor;",
            "2;Azul;-5;Calle Mayor;",
            "3;Morado;7;Calle Mayor;",
            "4;Verde;;Calle Mayor;",
            "5;Rojo;9;Calle Mayor;",
        ],
    );
    let output = dir.path().join("index.html");
    let summary = Generator::new(settings(&csv, None, &output)).run().unwrap();

    assert_eq!(summary.segments, 3);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.spots, 12 + 9);

    let payload = embedded_payload(&fs::read_to_string(&output).unwrap());
    let spots: i64 = payload["zones"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|z| z["segments"].as_array().unwrap())
        .map(|s| s["spots"].as_i64().unwrap())
        .inspect(|spots| assert!(*spots >= 0))
        .sum();
    assert_eq!(spots, 21);
    assert_eq!(payload["summary"]["spots"], 21);
}

#[test]
fn identical_input_gives_identical_payload() {
    let dir = tmp();
    let csv = write_csv(
        dir.path(),
        &["1;Azul;12;Calle Mayor;", "2;Verde;3;Gran Vía;Batería"],
    );
    let first = dir.path().join("first.html");
    let second = dir.path().join("second.html");

    Generator::new(settings(&csv, None, &first))
        .generated_at("2025-10-01T10:00:00Z")
        .run()
        .unwrap();
    Generator::new(settings(&csv, None, &second))
        .generated_at("2025-10-02T18:30:00Z")
        .run()
        .unwrap();

    let first = fs::read_to_string(first).unwrap();
    let second = fs::read_to_string(second).unwrap();
    assert_ne!(first, second);
    assert_eq!(embedded_payload(&first), embedded_payload(&second));
    assert!(first.contains("2025-10-01T10:00:00Z"));
}

#[test]
fn without_timestamp_output_is_byte_identical() {
    let dir = tmp();
    let csv = write_csv(dir.path(), &["1;Azul;12;Calle Mayor;"]);
    let output = dir.path().join("index.html");
    let mut settings = settings(&csv, None, &output);
    settings.timestamp = false;

    Generator::new(settings.clone()).run().unwrap();
    let first = fs::read(&output).unwrap();
    Generator::new(settings).run().unwrap();
    let second = fs::read(&output).unwrap();
    assert_eq!(first, second);
    assert!(String::from_utf8(first).unwrap().contains("const generatedAt = null;"));
}

#[test]
fn missing_csv_leaves_output_untouched() {
    let dir = tmp();
    let output = dir.path().join("index.html");
    fs::write(&output, "previous map").unwrap();

    let err = Generator::new(settings(&dir.path().join("missing.csv"), None, &output))
        .run()
        .unwrap_err();
    assert!(matches!(err, Error::Input(InputError::Io { .. })));
    assert_eq!(fs::read_to_string(&output).unwrap(), "previous map");
}

#[test]
fn missing_csv_creates_no_output() {
    let dir = tmp();
    let output = dir.path().join("index.html");
    let result = Generator::new(settings(&dir.path().join("missing.csv"), None, &output)).run();
    assert!(result.is_err());
    assert!(!output.exists());
}

#[test]
fn unwritable_output_is_output_error() {
    let dir = tmp();
    let csv = write_csv(dir.path(), &["1;Azul;12;Calle Mayor;"]);
    let output = dir.path().join("no_such_dir").join("index.html");

    let err = Generator::new(settings(&csv, None, &output)).run().unwrap_err();
    assert!(matches!(err, Error::Output(OutputError::Io { .. })));
    assert!(!output.exists());
}

#[test]
fn shapefile_join_drops_unmatched_records() {
    let dir = tmp();
    let layers = dir.path().join("SHP_ZIP");
    fs::create_dir(&layers).unwrap();
    write_segments_layer(
        &layers,
        &[
            line("1", &[(-3.7038, 40.4168), (-3.7030, 40.4170)]),
            line("2", &[(-3.6932, 40.4193), (-3.6920, 40.4195), (-3.6910, 40.4199)]),
            line("99", &[(-3.7000, 40.4100), (-3.7010, 40.4110)]),
        ],
    );
    let csv = write_csv(
        dir.path(),
        &[
            "1;Azul;12;Puerta del Sol;",
            "2;Verde;8;Calle de Alcalá;",
            "3;Rojo;5;Calle sin geometría;",
        ],
    );
    let output = dir.path().join("index.html");

    let summary = Generator::new(settings(&csv, Some(&layers), &output))
        .run()
        .unwrap();
    assert_eq!(summary.segments, 2);
    assert_eq!(summary.spots, 20);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.without_geometry, 0);

    let html = fs::read_to_string(&output).unwrap();
    let payload = embedded_payload(&html);
    let azul = &zone(&payload, "azul")["segments"][0];
    assert_eq!(azul["coords"][0][0], 40.4168);
    assert_eq!(azul["coords"][0][1], -3.7038);
    assert_eq!(azul["bay_type"], "Línea");
    assert_eq!(zone(&payload, "verde")["segments"][0]["coords"].as_array().unwrap().len(), 3);
    assert!(zone(&payload, "rojo")["segments"].as_array().unwrap().is_empty());
    assert!(!html.contains("\"id\":\"99\""));
}

#[test]
fn shapefile_join_keeps_unmatched_when_asked() {
    let dir = tmp();
    write_segments_layer(dir.path(), &[line("1", &[(-3.7038, 40.4168), (-3.7030, 40.4170)])]);
    let csv = write_csv(dir.path(), &["1;Azul;12;Puerta del Sol;", "3;Rojo;5;Calle Toledo;"]);
    let output = dir.path().join("index.html");
    let mut settings = settings(&csv, Some(dir.path()), &output);
    settings.unmatched = UnmatchedPolicy::Keep;

    let summary = Generator::new(settings).run().unwrap();
    assert_eq!(summary.segments, 2);
    assert_eq!(summary.without_geometry, 1);
    assert_eq!(summary.skipped, 0);
}

#[test]
fn zipped_archive_with_boundaries() {
    let dir = tmp();
    let layers = dir.path().join("layers");
    fs::create_dir(&layers).unwrap();
    write_segments_layer(&layers, &[line("1", &[(-3.7038, 40.4168), (-3.7030, 40.4170)])]);
    write_boundary_layer(
        &layers,
        &[
            ("Sol", (-3.71, 40.41)),
            ("No está en la zona SER", (-3.60, 40.50)),
            ("Cortes", (-3.70, 40.41)),
        ],
    );
    let archive = dir.path().join("SHP_ZIP.zip");
    zip_layers(&layers, &archive);
    let csv = write_csv(dir.path(), &["1;Azul;12;Puerta del Sol;"]);
    let output = dir.path().join("index.html");

    let summary = Generator::new(settings(&csv, Some(&archive), &output))
        .run()
        .unwrap();
    assert_eq!(summary.segments, 1);

    let payload = embedded_payload(&fs::read_to_string(&output).unwrap());
    let areas = payload["service_areas"].as_array().unwrap();
    assert_eq!(areas.len(), 2);
    assert!(areas.iter().all(|ring| ring.as_array().unwrap().len() >= 4));
}

#[test]
fn missing_shapefile_is_input_error() {
    let dir = tmp();
    let csv = write_csv(dir.path(), &["1;Azul;12;Calle Mayor;"]);
    let output = dir.path().join("index.html");
    let err = Generator::new(settings(&csv, Some(&dir.path().join("missing.zip")), &output))
        .run()
        .unwrap_err();
    assert!(matches!(err, Error::Input(InputError::Io { .. })));
    assert!(!output.exists());
}

#[test]
fn page_has_layer_toggle_and_popups() {
    let dir = tmp();
    let csv = write_csv(dir.path(), &["1;Azul;12;<script>alert(1)</script>;"]);
    let output = dir.path().join("index.html");
    let mut settings = settings(&csv, None, &output);
    settings.title = "Mapa <SER>".into();
    Generator::new(settings).run().unwrap();

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("L.control.layers"));
    assert!(html.contains("bindPopup"));
    assert!(html.contains("Mapa &lt;SER&gt;"));
    assert!(!html.contains("<script>alert(1)</script>"));
    assert!(!html.contains("{{payload}}"));
    let payload = embedded_payload(&html);
    assert_eq!(zone(&payload, "azul")["segments"][0]["street"], "<script>alert(1)</script>");
}
