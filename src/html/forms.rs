pub mod submit_abstract;
