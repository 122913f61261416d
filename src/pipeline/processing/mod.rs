// Pipeline processing: mapping raw records into canonical events

pub mod normalize;
