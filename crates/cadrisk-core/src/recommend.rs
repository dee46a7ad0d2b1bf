//! Lifestyle recommendations for active risk factors.
//!
//! One fixed text per factor, emitted in the order diabetes, hypertension,
//! smoking, obesity regardless of how the flags were produced.

use cadrisk_contracts::feature::RiskFactorFlags;

pub const DIABETES_ADVICE: &str =
    "Limit Carbohydrate intake and Perform Regular monitoring of blood sugar levels";
pub const HYPERTENSION_ADVICE: &str = "Start blood pressure lowering medications if not currently taking, or add BP med(s) to patient's existing regime";
pub const SMOKING_ADVICE: &str = "Facilitate tobacco cessation to the patient";
pub const OBESITY_ADVICE: &str = "Address comprehensive lifestyle interventions to the patient including calorie restriction for achieving and maintaining weight loss";

/// Map active risk factors to recommendation texts.
pub fn recommendations(flags: &RiskFactorFlags) -> Vec<String> {
    [
        (flags.diabetes, DIABETES_ADVICE),
        (flags.hypertension, HYPERTENSION_ADVICE),
        (flags.smoking, SMOKING_ADVICE),
        (flags.obesity, OBESITY_ADVICE),
    ]
    .into_iter()
    .filter(|(active, _)| *active)
    .map(|(_, text)| text.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_no_recommendations() {
        assert!(recommendations(&RiskFactorFlags::default()).is_empty());
    }

    #[test]
    fn all_flags_in_fixed_order() {
        let flags = RiskFactorFlags {
            diabetes: true,
            hypertension: true,
            smoking: true,
            obesity: true,
        };
        assert_eq!(
            recommendations(&flags),
            vec![DIABETES_ADVICE, HYPERTENSION_ADVICE, SMOKING_ADVICE, OBESITY_ADVICE]
        );
    }

    #[test]
    fn one_entry_per_active_flag() {
        let flags = RiskFactorFlags {
            diabetes: false,
            hypertension: false,
            smoking: true,
            obesity: true,
        };
        assert_eq!(recommendations(&flags), vec![SMOKING_ADVICE, OBESITY_ADVICE]);

        let flags = RiskFactorFlags {
            hypertension: true,
            ..Default::default()
        };
        assert_eq!(recommendations(&flags), vec![HYPERTENSION_ADVICE]);
    }

    #[test]
    fn texts_are_verbatim() {
        assert_eq!(SMOKING_ADVICE, "Facilitate tobacco cessation to the patient");
        assert!(HYPERTENSION_ADVICE.contains("patient's existing regime"));
        assert!(OBESITY_ADVICE.starts_with("Address comprehensive lifestyle interventions"));
    }
}
