//! Band power integration, ranking and percentage shares

use crate::spectrum::PowerSpectrum;
use brainwave_core::{Band, BandRanking, BandValues};

/// Band metrics derived from one spectrum.
///
/// Powers, ranking and percentages are only ever built together by
/// [`aggregate`], which keeps them consistent with each other.
#[derive(Debug, Clone, PartialEq)]
pub struct BandAnalysis {
    pub powers: BandValues,
    pub ranking: BandRanking,
    pub percentages: BandValues,
}

impl BandAnalysis {
    /// Zero powers and an empty ranking
    pub fn empty() -> Self {
        BandAnalysis {
            powers: BandValues::zeros(),
            ranking: BandRanking::empty(),
            percentages: BandValues::zeros(),
        }
    }

    pub fn dominant(&self) -> Option<(Band, f32)> {
        self.ranking.dominant()
    }
}

/// Mean power of the bins inside the band's closed interval.
///
/// 0.0 when no bin falls in range. Non-finite means (from non-finite
/// input samples) also degrade to 0.0.
pub fn band_power(spectrum: &PowerSpectrum, band: Band) -> f32 {
    let (sum, count) = spectrum
        .points()
        .iter()
        .filter(|point| band.contains(point.frequency))
        .fold((0.0f64, 0usize), |(sum, count), point| {
            (sum + point.power as f64, count + 1)
        });

    if count == 0 {
        return 0.0;
    }

    let mean = (sum / count as f64) as f32;
    if mean.is_finite() && mean > 0.0 {
        mean
    } else {
        0.0
    }
}

/// Each band's share of total power, in percent.
///
/// All zeros when the total is zero.
pub fn band_percentages(powers: &BandValues) -> BandValues {
    let total = powers.total();
    if total > 0.0 && total.is_finite() {
        BandValues::from_fn(|band| powers.get(band) / total * 100.0)
    } else {
        BandValues::zeros()
    }
}

/// Integrate a spectrum into band powers, ranking and percentages
pub fn aggregate(spectrum: &PowerSpectrum) -> BandAnalysis {
    let powers = BandValues::from_fn(|band| band_power(spectrum, band));
    let ranking = BandRanking::from_powers(&powers);
    let percentages = band_percentages(&powers);

    BandAnalysis {
        powers,
        ranking,
        percentages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::SpectralAnalyzer;
    use std::f32::consts::PI;

    fn spectrum_of(series: &[f32], sample_rate: f32) -> PowerSpectrum {
        SpectralAnalyzer::new(sample_rate).power_spectrum(series)
    }

    #[test]
    fn test_alpha_dominates_10hz_sine() {
        let series: Vec<f32> = (0..256)
            .map(|i| (2.0 * PI * 10.0 * i as f32 / 256.0).sin())
            .collect();
        let analysis = aggregate(&spectrum_of(&series, 256.0));

        let (band, power) = analysis.dominant().unwrap();
        assert_eq!(band, Band::Alpha);
        assert!(power > 0.1);
        for other in Band::ALL.into_iter().filter(|&b| b != Band::Alpha) {
            assert!(analysis.powers.get(other) < power);
        }
    }

    #[test]
    fn test_every_band_populated_and_non_negative() {
        let series: Vec<f32> = (0..512)
            .map(|i| {
                let t = i as f32 / 256.0;
                (2.0 * PI * 2.0 * t).sin() + 0.5 * (2.0 * PI * 21.0 * t).sin()
            })
            .collect();
        let analysis = aggregate(&spectrum_of(&series, 256.0));

        assert_eq!(analysis.powers.iter().count(), Band::COUNT);
        assert!(analysis.powers.iter().all(|(_, p)| p >= 0.0));
        assert_eq!(analysis.ranking.len(), Band::COUNT);

        let total: f32 = analysis.percentages.iter().map(|(_, p)| p).sum();
        assert!((total - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_flat_line_gives_zero_percentages() {
        let analysis = aggregate(&spectrum_of(&[0.0; 256], 256.0));

        assert!(analysis.powers.is_all_zero());
        assert!(analysis.percentages.is_all_zero());
        assert!(analysis.percentages.iter().all(|(_, p)| !p.is_nan()));
        // All bands tie at zero, so declaration order wins
        assert_eq!(analysis.ranking.bands(), Band::ALL.to_vec());
    }

    #[test]
    fn test_band_without_bins_is_zero() {
        // 50 Hz sampling: Nyquist at 25 Hz, gamma has no bins at all
        let series: Vec<f32> = (0..100)
            .map(|i| (2.0 * PI * 6.0 * i as f32 / 50.0).sin())
            .collect();
        let spectrum = spectrum_of(&series, 50.0);
        assert_eq!(band_power(&spectrum, Band::Gamma), 0.0);
        assert!(band_power(&spectrum, Band::Theta) > 0.0);
    }

    #[test]
    fn test_non_finite_input_degrades_to_zero() {
        let mut series = vec![1.0f32; 64];
        series[10] = f32::NAN;
        let analysis = aggregate(&spectrum_of(&series, 256.0));
        assert!(analysis.powers.is_all_zero());
        assert!(analysis.percentages.is_all_zero());
    }

    #[test]
    fn test_percentages_of_known_powers() {
        let mut powers = BandValues::zeros();
        powers.set(Band::Alpha, 3.0);
        powers.set(Band::Beta, 1.0);
        let percentages = band_percentages(&powers);
        assert_eq!(percentages.get(Band::Alpha), 75.0);
        assert_eq!(percentages.get(Band::Beta), 25.0);
        assert_eq!(percentages.get(Band::Delta), 0.0);
    }

    #[test]
    fn test_empty_analysis() {
        let analysis = aggregate(&PowerSpectrum::empty());
        assert!(analysis.powers.is_all_zero());
        assert_eq!(analysis.ranking.len(), Band::COUNT);
        assert!(BandAnalysis::empty().ranking.is_empty());
    }
}
