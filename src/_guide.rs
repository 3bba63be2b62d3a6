/*!

Tutorials, overviews, and etc... for the `malform` crate.

All the documentation that isn't API reference.

# Table of Contents

* [Driving Mutators from a Fuzzing Strategy][strategy_integration]
* [Writing a Mutator][writing_mutators]
* [Size Relations and Override Flags][size_relations]
* [Cargo Features][cargo_features]
* [Minimum Supported Rust Version][msrv]

 */

pub mod cargo_features;
pub mod msrv;
pub mod size_relations;
pub mod strategy_integration;
pub mod writing_mutators;
