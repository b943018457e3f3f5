//! Single-day weather summary and the outdoor suitability score derived from it

use std::fmt;

use serde::{Deserialize, Serialize};

/// Daily aggregate for one location and one date
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct WeatherDaySummary {
    /// WMO weather interpretation code
    pub condition_code: u8,
    /// Daily maximum temperature in Celsius
    pub high_c: f64,
    /// Daily minimum temperature in Celsius
    pub low_c: f64,
    /// Precipitation sum in mm
    pub precipitation_mm: f64,
}

impl WeatherDaySummary {
    /// Human-readable description of the condition code
    #[must_use]
    pub fn description(&self) -> &'static str {
        weather_code_to_description(self.condition_code)
    }
}

/// Penalty bracket a WMO condition code falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionBracket {
    /// Heavy rain, heavy snow, violent showers, thunderstorms
    Severe,
    /// Light or moderate rain, showers and drizzle
    Wet,
    Fog,
    Neutral,
}

impl ConditionBracket {
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            65 | 75 | 82 | 95 | 96 | 99 => ConditionBracket::Severe,
            51 | 53 | 61 | 63 | 80 | 81 => ConditionBracket::Wet,
            45 | 48 => ConditionBracket::Fog,
            _ => ConditionBracket::Neutral,
        }
    }

    fn penalty(self) -> i32 {
        match self {
            ConditionBracket::Severe => 80,
            ConditionBracket::Wet => 40,
            ConditionBracket::Fog => 20,
            ConditionBracket::Neutral => 0,
        }
    }
}

/// Outdoor-activity suitability in `[0, 100]`
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct OutdoorScore(u8);

impl OutdoorScore {
    pub const MAX: u8 = 100;

    /// Score a day. Condition and daytime-high penalties apply one tier each,
    /// precipitation and night-low penalties stack on top.
    #[must_use]
    pub fn from_summary(summary: &WeatherDaySummary) -> Self {
        let mut score: i32 = 100;

        score -= ConditionBracket::from_code(summary.condition_code).penalty();

        let precipitation = summary.precipitation_mm;
        if precipitation > 10.0 {
            score -= 50;
        } else if precipitation > 5.0 {
            score -= 30;
        } else if precipitation > 1.0 {
            score -= 15;
        }

        let high = summary.high_c;
        if high >= 32.0 {
            score -= 30;
        } else if high >= 28.0 {
            score -= 20;
        } else if high <= 0.0 {
            score -= 30;
        } else if high <= 5.0 {
            score -= 20;
        }

        let low = summary.low_c;
        if low <= -5.0 {
            score -= 20;
        } else if low <= 0.0 {
            score -= 10;
        }

        // clamp keeps the value inside u8
        Self(score.clamp(0, i32::from(Self::MAX)) as u8)
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Interpretation band for display
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self.0 {
            80..=100 => "great for outdoor activities",
            60..=79 => "fine for outdoor activities",
            40..=59 => "borderline",
            20..=39 => "outdoor plans not recommended",
            _ => "unsuitable for outdoor activities",
        }
    }
}

impl fmt::Display for OutdoorScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/100", self.0)
    }
}

/// Convert a WMO weather code to a human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn day(condition_code: u8, high_c: f64, low_c: f64, precipitation_mm: f64) -> WeatherDaySummary {
        WeatherDaySummary {
            condition_code,
            high_c,
            low_c,
            precipitation_mm,
        }
    }

    #[test]
    fn test_heavy_rain_clamps_to_zero() {
        let score = OutdoorScore::from_summary(&day(65, 10.0, 2.0, 15.0));
        assert_eq!(score.value(), 0);
    }

    #[test]
    fn test_clear_mild_day_is_perfect() {
        let score = OutdoorScore::from_summary(&day(0, 22.0, 12.0, 0.0));
        assert_eq!(score.value(), 100);
    }

    #[rstest]
    #[case(0, 22.0, 12.0, 0.0, 100)]
    #[case(61, 22.0, 12.0, 0.5, 60)]
    #[case(45, 22.0, 12.0, 0.0, 80)]
    #[case(2, 22.0, 12.0, 3.0, 85)]
    #[case(2, 22.0, 12.0, 7.0, 70)]
    #[case(2, 33.0, 24.0, 0.0, 70)]
    #[case(2, 29.0, 20.0, 0.0, 80)]
    #[case(2, -1.0, -6.0, 0.0, 50)]
    #[case(2, 4.0, -1.0, 0.0, 70)]
    #[case(55, 22.0, 12.0, 0.0, 100)]
    fn test_score_table(
        #[case] code: u8,
        #[case] high: f64,
        #[case] low: f64,
        #[case] precipitation: f64,
        #[case] expected: u8,
    ) {
        let score = OutdoorScore::from_summary(&day(code, high, low, precipitation));
        assert_eq!(score.value(), expected);
    }

    #[rstest]
    fn test_severe_conditions_never_exceed_twenty(
        #[values(65, 75, 82, 95, 96, 99)] code: u8,
        #[values(-20.0, 0.0, 15.0, 27.9, 40.0)] high: f64,
    ) {
        let score = OutdoorScore::from_summary(&day(code, high, high - 8.0, 0.0));
        assert!(score.value() <= 20);
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            OutdoorScore::from_summary(&day(0, 22.0, 12.0, 0.0)).label(),
            "great for outdoor activities"
        );
        assert_eq!(
            OutdoorScore::from_summary(&day(65, 10.0, 2.0, 15.0)).label(),
            "unsuitable for outdoor activities"
        );
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(day(0, 0.0, 0.0, 0.0).description(), "Clear sky");
        assert_eq!(day(95, 0.0, 0.0, 0.0).description(), "Thunderstorm");
        assert_eq!(day(200, 0.0, 0.0, 0.0).description(), "Unknown");
    }
}
