pub mod calculator;
pub mod types;

pub use calculator::{
    challenging_aspects, dominant_aspects, harmonious_aspects, special_aspect_houses,
    AspectEngine,
};
pub use types::{
    Aspect, AspectDefinition, AspectFactors, AspectKind, AspectTable, SpecialAspect,
};
