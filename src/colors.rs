use crate::grid::Metric;
use plotters::style::RGBColor;

/// ColorBrewer RdYlGn, red to green
const RD_YL_GN: [(f64, f64, f64); 11] = [
    (0.647_058_823_529_411_8, 0.0, 0.149_019_607_843_137_25),
    (0.843_137_254_901_960_8, 0.188_235_294_117_647_06, 0.152_941_176_470_588_25),
    (0.956_862_745_098_039_3, 0.427_450_980_392_156_84, 0.262_745_098_039_215_7),
    (0.992_156_862_745_098_1, 0.682_352_941_176_470_6, 0.380_392_156_862_745_1),
    (0.996_078_431_372_549, 0.878_431_372_549_019_6, 0.545_098_039_215_686_2),
    (1.0, 1.0, 0.749_019_607_843_137_3),
    (0.850_980_392_156_862_7, 0.937_254_901_960_784_3, 0.545_098_039_215_686_2),
    (0.650_980_392_156_862_8, 0.850_980_392_156_862_7, 0.415_686_274_509_803_94),
    (0.4, 0.741_176_470_588_235_3, 0.388_235_294_117_647_07),
    (0.101_960_784_313_725_49, 0.596_078_431_372_549_1, 0.313_725_490_196_078_43),
    (0.0, 0.407_843_137_254_901_96, 0.215_686_274_509_803_93),
];

/// Entries in the sampled palette
const LUT_SIZE: usize = 256;

/// Maps [0, 1] onto the red-yellow-green palette.
/// Out of range inputs stick to the ends.
pub fn rd_yl_gn(value: f64) -> RGBColor {
    let v = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };

    // the palette is sampled into a fixed table first, so nearby values
    // share a color
    let entry = ((v * LUT_SIZE as f64) as usize).min(LUT_SIZE - 1);
    let x = entry as f64 / (LUT_SIZE - 1) as f64;

    let idx = x * (RD_YL_GN.len() - 1) as f64;
    let i = (idx.floor() as usize).min(RD_YL_GN.len() - 2);
    let t = idx - i as f64;

    let (r0, g0, b0) = RD_YL_GN[i];
    let (r1, g1, b1) = RD_YL_GN[i + 1];
    let channel = |a: f64, b: f64| ((a + t * (b - a)) * 255.0).round() as u8;

    RGBColor(channel(r0, r1), channel(g0, g1), channel(b0, b1))
}

pub fn to_hex(color: &RGBColor) -> String {
    format!("#{:02x}{:02x}{:02x}", color.0, color.1, color.2)
}

/// How cell values are colored and labelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// distance per wait, km/min; higher is greener
    Speed,
    /// minutes; higher is redder
    Wait,
    /// km; higher is greener
    Distance,
}

impl Scale {
    pub fn for_metrics(metric: Metric, divider: Option<Metric>) -> Self {
        match (metric, divider) {
            (Metric::Distance, Some(Metric::Wait)) => Scale::Speed,
            (Metric::Wait, _) => Scale::Wait,
            (Metric::Distance, _) => Scale::Distance,
        }
    }

    /// Caps the value and maps it into the palette range
    pub fn normalize(&self, value: f64) -> f64 {
        match self {
            Scale::Speed => value.min(5.0) / 5.0,
            Scale::Wait => 0.9 - 0.9 * value.min(120.0) / 120.0,
            Scale::Distance => 0.9 * value.min(120.0) / 120.0,
        }
    }

    pub fn color(&self, value: f64) -> RGBColor {
        rd_yl_gn(self.normalize(value))
    }

    pub fn tooltip(&self, value: f64) -> String {
        match self {
            Scale::Speed => format!("{:.1} km/min", value),
            Scale::Wait => format!("{} min", value.trunc() as i64),
            Scale::Distance => format!("{} km", value.trunc() as i64),
        }
    }
}
