use crate::core::error::Result;
use crate::core::pair::{Pair, Score};
use crate::matching::equalizer::Equalizer;
use crate::matching::filter::Processor;
use crate::matching::operator::Operator;

/// Applies an [`Operator`] to every pair of a collection
pub struct BatchOperator {
    operator: Box<dyn Operator>,
}

impl BatchOperator {
    pub fn new(operator: impl Operator + 'static) -> Self {
        Self {
            operator: Box::new(operator),
        }
    }

    pub fn from_boxed(operator: Box<dyn Operator>) -> Self {
        Self { operator }
    }
}

impl Processor for BatchOperator {
    fn execute(&mut self, mut pairs: Vec<Pair>) -> Result<Vec<Pair>> {
        for pair in &mut pairs {
            self.operator.execute(pair)?;
        }
        Ok(pairs)
    }
}

/// Runs an [`Equalizer`] over the scores of a collection
///
/// Setup sees every current score, then each score is replaced by its
/// equalized value. Size and order are preserved.
pub struct BatchEqualizer {
    equalizer: Box<dyn Equalizer>,
}

impl BatchEqualizer {
    pub fn new(equalizer: impl Equalizer + 'static) -> Self {
        Self {
            equalizer: Box::new(equalizer),
        }
    }

    pub fn from_boxed(equalizer: Box<dyn Equalizer>) -> Self {
        Self { equalizer }
    }
}

impl Processor for BatchEqualizer {
    fn execute(&mut self, mut pairs: Vec<Pair>) -> Result<Vec<Pair>> {
        let values: Vec<Score> = pairs.iter().map(Pair::score).collect();
        self.equalizer.setup(&values);

        for pair in &mut pairs {
            let equalized = self.equalizer.equalize(pair.score());
            pair.set_score(equalized);
        }

        Ok(pairs)
    }
}
