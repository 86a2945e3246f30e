use chrono::{Datelike, Duration, NaiveDate, Timelike};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Hourly demand shape: commuter peaks on working days, a midday hump
/// otherwise.
fn hourly_shape(hour: u32, workingday: bool) -> f64 {
    if workingday {
        match hour {
            0..=5 => 0.1,
            6 => 0.5,
            7 => 1.2,
            8 => 2.0,
            9 => 1.0,
            10..=15 => 0.7,
            16 => 1.2,
            17 => 2.2,
            18 => 1.8,
            19 => 1.0,
            20..=21 => 0.6,
            _ => 0.3,
        }
    } else {
        match hour {
            0..=6 => 0.15,
            7..=9 => 0.5,
            10..=16 => 1.4,
            17..=18 => 1.0,
            19..=20 => 0.6,
            _ => 0.3,
        }
    }
}

/// Rough D.C. temperature in °C for a month and hour.
fn temperature(month: u32, hour: u32, rng: &mut SimpleRng) -> f64 {
    let seasonal = [3.0, 5.0, 10.0, 16.0, 21.0, 26.0, 29.0, 28.0, 24.0, 17.0, 11.0, 5.0];
    let base = seasonal[(month - 1) as usize];
    let diurnal = 4.0 * ((hour as f64 - 5.0) / 24.0 * std::f64::consts::TAU).sin();
    (base + diurnal + rng.gauss(0.0, 1.5)).clamp(-5.0, 41.0)
}

fn weather_code(rng: &mut SimpleRng) -> u8 {
    let roll = rng.next_f64();
    if roll < 0.66 {
        1
    } else if roll < 0.92 {
        2
    } else if roll < 0.99 {
        3
    } else {
        4
    }
}

fn main() {
    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "train.csv".to_string());

    let mut rng = SimpleRng::new(42);
    let mut writer = csv::Writer::from_path(&output_path).expect("Failed to create output file");
    writer
        .write_record([
            "datetime",
            "season",
            "weather",
            "temp",
            "workingday",
            "casual",
            "registered",
            "count",
        ])
        .expect("Failed to write header");

    // Like the Kaggle training split: the first 19 days of every month,
    // hourly, over 2011-2012.
    let mut rows = 0usize;
    for year in [2011, 2012] {
        for month in 1..=12u32 {
            let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid date");
            let mut ts = first.and_hms_opt(0, 0, 0).expect("valid time");
            while ts.day() <= 19 && ts.month() == month {
                let workingday = ts.weekday().num_days_from_monday() < 5;
                let season = (month - 1) / 3 + 1;
                let weather = weather_code(&mut rng);
                let temp = temperature(month, ts.hour(), &mut rng);

                let season_factor = [0.7, 1.1, 1.25, 0.95][(season - 1) as usize];
                let weather_factor = [1.0, 0.85, 0.4, 0.1][(weather - 1) as usize];
                let year_factor = if year == 2012 { 1.65 } else { 1.0 };
                let expected = 110.0
                    * hourly_shape(ts.hour(), workingday)
                    * season_factor
                    * weather_factor
                    * year_factor;

                let count = rng.gauss(expected, expected.sqrt() * 2.0).max(0.0) as u32;
                let casual_share = if workingday { 0.18 } else { 0.45 };
                let casual = (f64::from(count) * casual_share) as u32;
                let registered = count - casual;

                writer
                    .write_record([
                        ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                        season.to_string(),
                        weather.to_string(),
                        format!("{temp:.2}"),
                        u8::from(workingday).to_string(),
                        casual.to_string(),
                        registered.to_string(),
                        count.to_string(),
                    ])
                    .expect("Failed to write row");

                rows += 1;
                ts += Duration::hours(1);
            }
        }
    }

    writer.flush().expect("Failed to flush output");
    println!("Wrote {rows} hourly rental rows to {output_path}");
}
