use crate::types::CrimeEstimate;

// Thresholds on category rates, not on the overall safety score.
const VIOLENT_CRIME_THRESHOLD: f64 = 5.0;
const PROPERTY_CRIME_THRESHOLD: f64 = 15.0;
const ROBBERY_THRESHOLD: f64 = 5.0;
const HIGH_TOTAL_THRESHOLD: f64 = 40.0;
const LOW_TOTAL_THRESHOLD: f64 = 10.0;

const BASELINE: &str = "Stay aware of your surroundings at all times.";

/// Maps a crime estimate to ordered, human-readable guidance.
///
/// No estimate means no guidance (empty list, not an error). The baseline
/// advisory always comes first; each threshold rule is evaluated
/// independently and appends in a fixed order, except the total-rate pair
/// where the low-crime reassurance is the else-branch of the high-crime
/// rule.
pub fn recommendations(estimate: Option<&CrimeEstimate>) -> Vec<String> {
    let Some(estimate) = estimate else {
        return Vec::new();
    };

    let mut advice = vec![BASELINE.to_string()];

    if estimate.rate("violent-crime") > VIOLENT_CRIME_THRESHOLD {
        advice.push("Consider traveling with a companion, especially at night.".to_string());
    }
    if estimate.rate("property-crime") > PROPERTY_CRIME_THRESHOLD {
        advice.push("Keep valuables out of sight and secure.".to_string());
    }
    if estimate.rate("robbery") > ROBBERY_THRESHOLD {
        advice.push("Avoid displaying expensive items in public.".to_string());
        advice.push("Stay in well-lit areas at night.".to_string());
    }
    if estimate.total_crime_rate > HIGH_TOTAL_THRESHOLD {
        advice.push("Consider alternate routes through lower-crime areas.".to_string());
        advice.push("Stick to main streets with higher foot traffic.".to_string());
    } else if estimate.total_crime_rate < LOW_TOTAL_THRESHOLD {
        advice.push("This area has comparatively lower crime rates.".to_string());
    }

    advice
}
