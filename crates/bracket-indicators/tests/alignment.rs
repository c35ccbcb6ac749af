//! Property tests: every indicator output is aligned with its input and
//! defined exactly from its warm-up onwards.

use bracket_core::traits::{Indicator, MultiOutputIndicator};
use bracket_indicators::{BollingerBands, Ema, LinRegSlope, Lsma, Rsi, Sma, StdDev, StochRsi};
use proptest::prelude::*;

fn prices() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..1000.0, 0..120)
}

fn check_alignment(len: usize, warmup: usize, first_defined: Option<usize>) {
    if len >= warmup {
        assert_eq!(first_defined, Some(warmup - 1));
    } else {
        assert_eq!(first_defined, None);
    }
}

proptest! {
    #[test]
    fn single_output_indicators_are_aligned(data in prices(), period in 1usize..30) {
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Sma::new(period)),
            Box::new(Ema::new(period)),
            Box::new(Lsma::new(period)),
            Box::new(LinRegSlope::new(period + 1)),
            Box::new(Rsi::new(period)),
            Box::new(StdDev::new(period)),
        ];

        for indicator in &indicators {
            let series = indicator.calculate(&data);
            prop_assert_eq!(series.len(), data.len());
            check_alignment(data.len(), indicator.warmup(), series.first_defined());
        }
    }

    #[test]
    fn multi_output_indicators_are_aligned(data in prices(), period in 2usize..20) {
        let bands = BollingerBands::with_params(period, 2.0);
        let series = bands.calculate(&data);
        prop_assert_eq!(series.len(), data.len());
        check_alignment(data.len(), bands.warmup(), series.first_defined());

        let stoch = StochRsi::with_params(period, period, 3, 3);
        let series = stoch.calculate(&data);
        prop_assert_eq!(series.len(), data.len());
        check_alignment(data.len(), stoch.warmup(), series.first_defined());
    }

    #[test]
    fn prefix_values_do_not_depend_on_later_bars(data in prices(), cut in 0usize..120) {
        let cut = cut.min(data.len());
        let sma = Sma::new(5);
        let full = sma.calculate(&data);
        let prefix = sma.calculate(&data[..cut]);
        for i in 0..cut {
            prop_assert_eq!(full.get(i), prefix.get(i));
        }
    }

    #[test]
    fn rsi_stays_in_range(data in prices()) {
        for value in Rsi::new(14).calculate(&data).defined() {
            prop_assert!((0.0..=100.0).contains(&value));
        }
    }
}
