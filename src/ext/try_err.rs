/// Try with custom error message
pub trait TryErr<T, E> {
    /// try with custom error message
    fn try_err(self, err: E) -> Result<T, E>;
}

impl<T, E> TryErr<T, E> for Option<T> {
    fn try_err(self, err: E) -> Result<T, E> {
        match self {
            Some(v) => Ok(v),
            None => Err(err),
        }
    }
}

#[test]
fn test_try_err() {
    assert_eq!(Some(3).try_err("missing"), Ok(3));
    assert_eq!(None::<i32>.try_err("missing"), Err("missing"));
}
