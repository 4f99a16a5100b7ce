//! Export helpers for CSV and JSON artifacts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

pub mod windows {
    use std::io::{self, Write};

    use satvis_windows::{IntervalCollection, Window};

    const HEADER: &str = "label,start,end,duration";

    /// Write the standard windows CSV header.
    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    /// Serialize one window, matching the header ordering.
    pub fn write_window(writer: &mut dyn Write, window: &Window) -> io::Result<()> {
        writeln!(
            writer,
            "{},{},{},{}",
            window.label(),
            window.start(),
            window.end(),
            window.duration()
        )
    }

    /// Header plus one row per window in collection order.
    pub fn write_all(writer: &mut dyn Write, windows: &IntervalCollection) -> io::Result<()> {
        write_header(writer)?;
        for window in windows {
            write_window(writer, window)?;
        }
        writer.flush()
    }
}

pub mod crossings {
    use std::io::{self, Write};

    use satvis_windows::Crossing;

    const HEADER: &str = "time,direction";

    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    pub fn write_all(writer: &mut dyn Write, crossings: &[Crossing]) -> io::Result<()> {
        write_header(writer)?;
        for crossing in crossings {
            writeln!(writer, "{},{}", crossing.time, crossing.direction.label())?;
        }
        writer.flush()
    }
}

pub mod report {
    use std::io::{self, Write};
    use std::path::Path;

    use serde::Serialize;
    use serde_json::to_writer_pretty;

    use satvis_windows::{Crossing, ExtractionMode, IntervalCollection, WindowExtraction};

    /// Run metadata carried alongside the extracted windows.
    #[derive(Debug)]
    pub struct Metadata<'a> {
        pub label: &'a str,
        pub mode: ExtractionMode,
        pub body: Option<&'a str>,
        pub samples: usize,
        pub start: f64,
        pub end: f64,
    }

    #[derive(Serialize)]
    struct Report<'a> {
        label: &'a str,
        mode: ExtractionMode,
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<&'a str>,
        samples: usize,
        start: f64,
        end: f64,
        visible_duration: f64,
        crossings: &'a [Crossing],
        windows: &'a IntervalCollection,
    }

    /// Write a pretty-printed JSON report of one extraction.
    pub fn write_report(
        path: &Path,
        meta: &Metadata<'_>,
        extraction: &WindowExtraction,
    ) -> io::Result<()> {
        let report = Report {
            label: meta.label,
            mode: meta.mode,
            body: meta.body,
            samples: meta.samples,
            start: meta.start,
            end: meta.end,
            visible_duration: extraction.windows.total_duration(meta.label),
            crossings: &extraction.crossings,
            windows: &extraction.windows,
        };
        let mut writer = super::writer_for_path(path)?;
        to_writer_pretty(&mut writer, &report).map_err(io::Error::other)?;
        writeln!(writer)?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satvis_windows::{ExtractionMode, extract_windows};

    fn sample_extraction() -> satvis_windows::WindowExtraction {
        let t = [0.0, 1.0, 2.0, 3.0, 4.0];
        let v = [-1.0, 1.0, 1.0, -1.0, -1.0];
        extract_windows(&v, &t, "gs-1", ExtractionMode::Endpoint).unwrap()
    }

    #[test]
    fn windows_csv_has_header_and_rows() {
        let extraction = sample_extraction();
        let mut buf = Vec::new();
        windows::write_all(&mut buf, &extraction.windows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["label,start,end,duration", "gs-1,0.5,2.5,2"]);
    }

    #[test]
    fn crossings_csv_lists_directions() {
        let extraction = sample_extraction();
        let mut buf = Vec::new();
        crossings::write_all(&mut buf, &extraction.crossings).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "time,direction\n0.5,rise\n2.5,set\n");
    }

    #[test]
    fn json_report_round_trips_through_serde() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        let extraction = sample_extraction();
        let meta = report::Metadata {
            label: "gs-1",
            mode: ExtractionMode::Endpoint,
            body: Some("EARTH"),
            samples: 5,
            start: 0.0,
            end: 4.0,
        };
        report::write_report(&path, &meta, &extraction).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["mode"], "endpoint");
        assert_eq!(value["body"], "EARTH");
        assert_eq!(value["visible_duration"], 2.0);
        assert_eq!(value["crossings"][0]["direction"], "rise");
        assert_eq!(value["windows"][0]["start"], 0.5);
        assert_eq!(value["windows"].as_array().unwrap().len(), 1);
    }
}
