/*!
 Errors that can happen while decoding archives.
*/

pub mod typedstream;
