use mlsim_core::Float;

/// A differentiable function of one scalar parameter.
pub trait Objective<T: Float> {
    fn value(&self, w: T) -> T;
    fn gradient(&self, w: T) -> T;
}

/// `f(w) = w²`, minimum at 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quadratic;

impl<T: Float> Objective<T> for Quadratic {
    fn value(&self, w: T) -> T {
        w * w
    }

    fn gradient(&self, w: T) -> T {
        T::TWO * w
    }
}

/// Objective built from a function and its derivative.
pub struct FnObjective<F, G> {
    f: F,
    df: G,
}

impl<F, G> FnObjective<F, G> {
    pub fn new(f: F, df: G) -> Self {
        FnObjective { f, df }
    }
}

impl<T, F, G> Objective<T> for FnObjective<F, G>
where
    T: Float,
    F: Fn(T) -> T,
    G: Fn(T) -> T,
{
    fn value(&self, w: T) -> T {
        (self.f)(w)
    }

    fn gradient(&self, w: T) -> T {
        (self.df)(w)
    }
}

impl<T: Float, O: Objective<T> + ?Sized> Objective<T> for &O {
    fn value(&self, w: T) -> T {
        (**self).value(w)
    }

    fn gradient(&self, w: T) -> T {
        (**self).gradient(w)
    }
}
