//! Transformer trait for table transformation

use eyre::Result;

/// Transformer trait for transforming a value into another
///
/// Implementors define one cleaning step:
/// - Missing value handling
/// - Type coercion
/// - Deduplication
///
/// Transformers compose with [`Transformer::chain`], so a recipe of steps reads
/// like the pipe it is.
///
/// # Example
/// ```
/// use parquet_etl::etl::Transformer;
/// use parquet_etl::transform::{Deduplicator, MissingHandler, MissingPolicy};
/// use polars::prelude::*;
///
/// let table = df!(
///     "id" => [1i64, 1, 2],
///     "seen" => [Some(1i64), Some(2), None],
/// ).unwrap();
///
/// let cleaning = MissingHandler::new(["seen"], MissingPolicy::Drop)
///     .chain(Deduplicator::new("id", "seen"));
///
/// let output = cleaning.transform(table).unwrap();
/// assert_eq!(output.height(), 1);
/// ```
pub trait Transformer: Send + Sync {
    /// Input type
    type Input: Send;

    /// Output type after transformation
    type Output: Send;

    /// Transform a single value
    ///
    /// # Errors
    /// Returns an error if transformation fails (configuration, missing columns, etc.)
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;

    /// Feed the output of this transformer into `next`
    fn chain<T>(self, next: T) -> Chain<Self, T>
    where
        Self: Sized,
        T: Transformer<Input = Self::Output>,
    {
        Chain { first: self, next }
    }
}

/// Two transformers applied one after the other
pub struct Chain<A, B> {
    first: A,
    next: B,
}

impl<A, B> Transformer for Chain<A, B>
where
    A: Transformer,
    B: Transformer<Input = A::Output>,
{
    type Input = A::Input;
    type Output = B::Output;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        self.next.transform(self.first.transform(input)?)
    }
}

/// Identity transformer that passes values through unchanged
///
/// Used for datasets that have no cleaning recipe.
pub struct IdentityTransformer<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for IdentityTransformer<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T> IdentityTransformer<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Send + Sync> Transformer for IdentityTransformer<T> {
    type Input = T;
    type Output = T;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        Ok(input)
    }
}
