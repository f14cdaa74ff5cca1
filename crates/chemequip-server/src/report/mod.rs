//! PDF reports for a single dataset
//!
//! A report is a pure function of the dataset row and its equipment. The
//! optional rendering time only appears in the page footer and is left out
//! of the content digest, so two renders of the same dataset always carry
//! the same digest.

pub mod pdf;

use chemequip_common::checksum::Checksum;
use chemequip_common::types::Parameter;
use chemequip_common::{EquipmentRecord, Summary};
use chrono::{DateTime, Utc};

use crate::db::datasets::Dataset;
use pdf::{Font, PdfWriter, MARGIN};

pub const REPORT_TITLE: &str = "Chemical Equipment Analysis Report";

/// Equipment table columns: x offset and characters that fit at
/// [`TABLE_FONT_SIZE`].
const TABLE_COLUMNS: [(&str, f32, usize); 6] = [
    ("#", MARGIN, 5),
    ("Name", MARGIN + 28.0, 28),
    ("Type", MARGIN + 178.0, 15),
    ("Flowrate", MARGIN + 258.0, 16),
    ("Pressure", MARGIN + 342.0, 15),
    ("Temperature", MARGIN + 422.0, 16),
];

const TABLE_FONT_SIZE: f32 = 9.0;
/// Smallest size a long cell is shrunk to before it wraps instead.
const TABLE_MIN_FONT_SIZE: f32 = 6.0;
const TABLE_ROW_HEIGHT: f32 = 12.0;
/// Baseline distance between wrapped lines of one cell.
const TABLE_WRAP_HEIGHT: f32 = 8.0;

/// How one table cell is drawn: a font size and one or more lines that
/// together hold the full text.
#[derive(Debug, Clone, PartialEq)]
struct CellLayout {
    size: f32,
    lines: Vec<String>,
}

/// Lay out `text` in a column `max_chars` wide. Text that is too long is
/// shrunk, and once at the minimum size it is split over several lines.
/// Nothing is ever dropped.
fn layout_cell(text: &str, max_chars: usize) -> CellLayout {
    let len = text.chars().count();
    if len <= max_chars {
        return CellLayout {
            size: TABLE_FONT_SIZE,
            lines: vec![text.to_string()],
        };
    }

    let shrunk = TABLE_FONT_SIZE * max_chars as f32 / len as f32;
    if shrunk >= TABLE_MIN_FONT_SIZE {
        return CellLayout {
            size: shrunk,
            lines: vec![text.to_string()],
        };
    }

    let per_line = ((max_chars as f32 * TABLE_FONT_SIZE / TABLE_MIN_FONT_SIZE) as usize).max(1);
    let chars: Vec<char> = text.chars().collect();
    CellLayout {
        size: TABLE_MIN_FONT_SIZE,
        lines: chars.chunks(per_line).map(|c| c.iter().collect()).collect(),
    }
}

pub struct ReportInput<'a> {
    pub dataset: &'a Dataset,
    /// In row order.
    pub equipment: &'a [EquipmentRecord],
}

#[derive(Debug, Clone)]
pub struct Report {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub digest: Checksum,
}

/// `Report_<stem>.pdf` for an uploaded file name.
pub fn report_filename(dataset_filename: &str) -> String {
    let stem = std::path::Path::new(dataset_filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "dataset".to_string());
    let safe: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    format!("Report_{safe}.pdf")
}

pub fn format_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.2} {unit}"),
        None => "N/A".to_string(),
    }
}

/// Everything drawn is also fed to the digest, up to the digest line.
struct Canvas {
    writer: PdfWriter,
    drawn: Vec<String>,
}

impl Canvas {
    fn line(&mut self, font: Font, size: f32, text: String) {
        self.writer.line(font, size, &text);
        self.drawn.push(text);
    }

    fn cell(&mut self, x: f32, font: Font, text: String) {
        self.writer.text(x, font, TABLE_FONT_SIZE, &text);
        self.drawn.push(text);
    }

    /// One equipment row. Wrapped cells push the row down; a row that
    /// reaches the footer carries on below a repeated header.
    fn row(&mut self, cells: [String; 6]) {
        let layouts: Vec<CellLayout> = TABLE_COLUMNS
            .iter()
            .zip(&cells)
            .map(|((_, _, width), text)| layout_cell(text, *width))
            .collect();
        let depth = layouts.iter().map(|l| l.lines.len()).max().unwrap_or(1);

        let height = TABLE_ROW_HEIGHT + (depth - 1) as f32 * TABLE_WRAP_HEIGHT;
        if self.writer.reserve(height) {
            self.table_header();
        }
        self.writer.advance(TABLE_ROW_HEIGHT);

        for line in 0..depth {
            if line > 0 {
                if self.writer.reserve(TABLE_WRAP_HEIGHT) {
                    self.table_header();
                }
                self.writer.advance(TABLE_WRAP_HEIGHT);
            }
            for ((_, x, _), layout) in TABLE_COLUMNS.iter().zip(&layouts) {
                if let Some(text) = layout.lines.get(line) {
                    self.writer.text(*x, Font::Regular, layout.size, text);
                }
            }
        }

        self.drawn.extend(cells);
    }

    fn heading(&mut self, text: &str) {
        self.writer.reserve(40.0);
        self.writer.advance(8.0);
        self.line(Font::Bold, 13.0, text.to_string());
        self.writer.rule();
    }

    fn table_header(&mut self) {
        self.writer.advance(TABLE_ROW_HEIGHT);
        for (label, x, _) in TABLE_COLUMNS {
            self.cell(x, Font::Bold, label.to_string());
        }
        self.writer.advance(4.0);
    }

    fn digest(&self) -> Checksum {
        Checksum::of_parts(self.drawn.iter().map(|s| s.as_bytes()))
    }
}

#[tracing::instrument(skip(input), fields(dataset_id = %input.dataset.id, records = input.equipment.len()))]
pub fn render_report(input: &ReportInput<'_>, rendered_at: Option<DateTime<Utc>>) -> Report {
    let dataset = input.dataset;
    let summary = Summary::from_records(input.equipment);

    let mut canvas = Canvas {
        writer: PdfWriter::new(format!("{REPORT_TITLE}: {}", dataset.filename)),
        drawn: Vec::new(),
    };

    canvas.line(Font::Bold, 18.0, REPORT_TITLE.to_string());
    canvas.writer.advance(6.0);

    canvas.heading("Dataset Information");
    canvas.line(Font::Regular, 10.0, format!("Filename: {}", dataset.filename));
    canvas.line(
        Font::Regular,
        10.0,
        format!("Uploaded: {}", dataset.uploaded_at.format("%Y-%m-%d %H:%M:%S UTC")),
    );
    canvas.line(Font::Regular, 10.0, format!("Equipment count: {}", summary.total_equipment));
    canvas.line(Font::Regular, 10.0, format!("Skipped rows: {}", dataset.skipped_rows));

    canvas.heading("Summary Statistics");
    for parameter in Parameter::ALL {
        let unit = parameter.unit();
        let (min, max) = summary.range(parameter);
        canvas.line(
            Font::Regular,
            10.0,
            format!(
                "{}: average {}, min {}, max {}",
                parameter.label(),
                format_value(summary.average(parameter), unit),
                format_value(min, unit),
                format_value(max, unit),
            ),
        );
    }

    canvas.heading("Equipment Type Distribution");
    if summary.equipment_type_distribution.is_empty() {
        canvas.line(Font::Regular, 10.0, "No equipment records.".to_string());
    }
    for (equipment_type, count) in &summary.equipment_type_distribution {
        let share = *count as f64 * 100.0 / summary.total_equipment as f64;
        canvas.line(Font::Regular, 10.0, format!("{equipment_type}: {count} ({share:.1}%)"));
    }

    canvas.heading("Equipment Details");
    canvas.table_header();
    for record in input.equipment {
        canvas.row([
            (record.position + 1).to_string(),
            record.name.clone(),
            record.equipment_type.to_string(),
            format_value(record.flowrate, Parameter::Flowrate.unit()),
            format_value(record.pressure, Parameter::Pressure.unit()),
            format_value(record.temperature, Parameter::Temperature.unit()),
        ]);
    }

    let digest = canvas.digest();
    canvas.writer.advance(TABLE_ROW_HEIGHT);
    canvas
        .writer
        .line(Font::Regular, 8.0, &format!("Content digest: sha256:{digest}"));

    let footer = rendered_at.map(|at| format!("Rendered at {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
    let bytes = canvas.writer.finish(footer.as_deref());

    tracing::debug!(size = bytes.len(), digest = %digest.short(), "Report rendered");

    Report {
        filename: report_filename(&dataset.filename),
        bytes,
        digest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemequip_common::EquipmentType;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn dataset(equipment: &[EquipmentRecord]) -> Dataset {
        Dataset {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            filename: "plant data.csv".to_string(),
            uploaded_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
            equipment_count: equipment.len() as i64,
            skipped_rows: 0,
            checksum: "00".repeat(32),
            summary_stats: Summary::from_records(equipment),
        }
    }

    fn equipment(count: usize) -> Vec<EquipmentRecord> {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        (0..count)
            .map(|i| EquipmentRecord {
                id: Uuid::nil(),
                dataset_id: Uuid::nil(),
                position: i as i64,
                name: if i == 0 { "Pump-01".to_string() } else { format!("Unit-{i:03}") },
                equipment_type: if i % 2 == 0 { EquipmentType::Pump } else { EquipmentType::HeatExchanger },
                flowrate: Some(150.5),
                pressure: if i == 0 { None } else { Some(5.2) },
                temperature: Some(45.0),
                created_at,
            })
            .collect()
    }

    fn text(report: &Report) -> String {
        String::from_utf8_lossy(&report.bytes).into_owned()
    }

    #[test]
    fn test_report_filename() {
        assert_eq!(report_filename("plant.csv"), "Report_plant.pdf");
        assert_eq!(report_filename("plant data.csv"), "Report_plant_data.pdf");
        assert_eq!(report_filename(".csv"), "Report_.csv.pdf");
    }

    #[test]
    fn test_report_contents() {
        let records = equipment(2);
        let ds = dataset(&records);
        let report = render_report(&ReportInput { dataset: &ds, equipment: &records }, None);
        let pdf = text(&report);

        assert!(pdf.starts_with("%PDF-1.4"));
        assert!(pdf.contains(&format!("({REPORT_TITLE})")));
        assert!(pdf.contains("(Filename: plant data.csv)"));
        assert!(pdf.contains("(Pump-01)"));
        assert!(pdf.contains("(Heat Exchanger)"));
        assert!(pdf.contains("(N/A)"));
        assert!(pdf.contains("(Pump: 1 "));
        assert!(pdf.contains("50.0%"));
        assert!(pdf.contains(&format!("sha256:{}", report.digest)));
        assert!(!pdf.contains("Rendered at"));
        assert_eq!(report.filename, "Report_plant_data.pdf");
    }

    #[test]
    fn test_report_is_deterministic() {
        let records = equipment(5);
        let ds = dataset(&records);
        let input = ReportInput { dataset: &ds, equipment: &records };
        let a = render_report(&input, None);
        let b = render_report(&input, None);
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.digest, b.digest);
    }

    #[test]
    fn test_render_time_does_not_change_digest() {
        let records = equipment(3);
        let ds = dataset(&records);
        let input = ReportInput { dataset: &ds, equipment: &records };
        let plain = render_report(&input, None);
        let stamped = render_report(&input, Some(Utc.with_ymd_and_hms(2025, 3, 2, 8, 0, 0).unwrap()));

        assert_eq!(plain.digest, stamped.digest);
        assert_ne!(plain.bytes, stamped.bytes);
        assert!(text(&stamped).contains("(Rendered at 2025-03-02 08:00:00 UTC)"));
    }

    #[test]
    fn test_digest_tracks_data() {
        let records = equipment(3);
        let ds = dataset(&records);
        let mut changed = records.clone();
        changed[1].flowrate = Some(151.0);

        let a = render_report(&ReportInput { dataset: &ds, equipment: &records }, None);
        let b = render_report(&ReportInput { dataset: &ds, equipment: &changed }, None);
        assert_ne!(a.digest, b.digest);
    }

    #[test]
    fn test_large_dataset_paginates() {
        let records = equipment(200);
        let ds = dataset(&records);
        let report = render_report(&ReportInput { dataset: &ds, equipment: &records }, None);
        let pdf = text(&report);
        assert!(pdf.matches("/MediaBox").count() >= 4);
        assert!(pdf.contains("(Unit-199)"));
    }

    #[test]
    fn test_layout_cell_keeps_all_text() {
        assert_eq!(
            layout_cell("Pump-01", 28),
            CellLayout { size: TABLE_FONT_SIZE, lines: vec!["Pump-01".to_string()] }
        );

        let name = "Centrifugal-Feed-Pump-North-Section-0001";
        let shrunk = layout_cell(name, 28);
        assert_eq!(shrunk.lines, vec![name.to_string()]);
        assert!(shrunk.size < TABLE_FONT_SIZE && shrunk.size >= TABLE_MIN_FONT_SIZE);

        let long = "X".repeat(100);
        let wrapped = layout_cell(&long, 28);
        assert_eq!(wrapped.size, TABLE_MIN_FONT_SIZE);
        assert!(wrapped.lines.len() > 1);
        assert!(wrapped.lines.iter().all(|l| l.chars().count() <= 42));
        assert_eq!(wrapped.lines.concat(), long);
    }

    #[test]
    fn test_long_names_and_values_are_printed_in_full() {
        let mut records = equipment(3);
        records[0].name = "Centrifugal-Feed-Pump-North-Section-0001".to_string();
        records[0].flowrate = Some(123456789012.34);
        records[1].name = "Centrifugal-Feed-Pump-North-Section-0002".to_string();
        records[2].name = format!("Very-Long-Tag-{}", "9".repeat(120));
        let ds = dataset(&records);
        let report = render_report(&ReportInput { dataset: &ds, equipment: &records }, None);
        let pdf = text(&report);

        assert!(pdf.contains("(Centrifugal-Feed-Pump-North-Section-0001)"));
        assert!(pdf.contains("(Centrifugal-Feed-Pump-North-Section-0002)"));
        assert!(pdf.contains("(123456789012.34 L/min)"));
        assert!(!pdf.contains("..."));

        let wrapped: String = layout_cell(&records[2].name, 28).lines.concat();
        assert_eq!(wrapped, records[2].name);
        for line in layout_cell(&records[2].name, 28).lines {
            assert!(pdf.contains(&format!("({line})")));
        }
    }

    #[test]
    fn test_empty_dataset() {
        let ds = dataset(&[]);
        let report = render_report(&ReportInput { dataset: &ds, equipment: &[] }, None);
        let pdf = text(&report);
        assert!(pdf.contains("(No equipment records.)"));
        assert!(pdf.contains("(Flowrate: average N/A, min N/A, max N/A)"));
    }
}
