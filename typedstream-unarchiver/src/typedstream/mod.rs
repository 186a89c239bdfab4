/*!
 Contains logic and data structures used to decode `typedstream` archives into native Rust data structures.

 ## Overview

 The typedstream format is a binary serialization protocol designed for `C` and `Objective-C` data structures.
 It is primarily used in Apple's Foundation framework, specifically within the `NSArchiver` and `NSUnarchiver` classes.

 ## Origin

 The format is derived from the data structure used by NeXTSTEP's `NXTypedStream` APIs.

 ## Features

 - Pure Rust implementation, no dependencies on Apple frameworks
 - Shared and cyclic object graphs are rebuilt with stable handles
 - Host applications supply the decode logic for their own classes
 - Deterministic errors for malformed, truncated, or hostile input
*/

pub mod buffered;
pub mod coder;
pub mod cursor;
pub mod models;
pub mod parser;
pub mod registry;
pub mod table;
pub mod types;
pub mod unarchiver;
mod tests;
