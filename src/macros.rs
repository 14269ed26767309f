/// Builds a `Vec<Scalar>` from a list of expressions, converting each with
/// `Scalar::from`.
///
/// ```rust
/// use serde_tt::{row, Scalar};
///
/// let r = row![1, "two", 3.5, Scalar::Null];
/// assert_eq!(r[1], Scalar::Str("two".to_string()));
/// assert!(r[3].is_null());
/// ```
#[macro_export]
macro_rules! row {
    () => {
        ::std::vec::Vec::<$crate::Scalar>::new()
    };

    ($($value:expr),+ $(,)?) => {
        vec![$($crate::Scalar::from($value)),+]
    };
}
