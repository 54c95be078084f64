use rust_xlsxwriter::{Format, Workbook, XlsxError};

const OUTPUT_PATH: &str = "sample_names.xlsx";
const ROWS: u32 = 12_000;

const FIRST_NAMES: &[&str] = &[
    "Budi", "Siti", "Agus", "Dewi", "Eko", "Rina", "Joko", "Putri", "Andi", "Sri",
    "Rizky", "Ayu", "Fajar", "Indah", "Hendra", "Lestari", "Bayu", "Wulan", "Dimas", "Nur",
];

const LAST_NAMES: &[&str] = &[
    "Santoso", "Wijaya", "Saputra", "Rahmawati", "Hidayat", "Pratama", "Kusuma",
    "Lestari", "Nugroho", "Sari", "Siregar", "Simanjuntak", "Setiawan", "Utami",
];

const CITIES: &[&str] = &[
    "Jakarta", "Bandung", "Surabaya", "Medan", "Yogyakarta", "Semarang", "Makassar", "Denpasar",
];

/// Deterministic SplitMix64 generator, so every run writes the same file.
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

fn main() -> Result<(), XlsxError> {
    let mut rng = SampleRng(42);

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, header) in ["ID", "Nama", "Kota"].iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    let mut blanks = 0;
    for i in 1..=ROWS {
        sheet.write_number(i, 0, f64::from(i))?;
        // About 1% of rows get no name.
        if rng.chance(1) {
            blanks += 1;
        } else {
            let name = if rng.chance(30) {
                rng.pick(FIRST_NAMES).to_string()
            } else {
                format!("{} {}", rng.pick(FIRST_NAMES), rng.pick(LAST_NAMES))
            };
            sheet.write_string(i, 1, name)?;
        }
        sheet.write_string(i, 2, rng.pick(CITIES))?;
    }

    workbook.save(OUTPUT_PATH)?;

    println!("Wrote {ROWS} rows ({blanks} without a name) to {OUTPUT_PATH}");
    Ok(())
}
