/*!

# Cargo Features

* **`std`** (default): Implement `std::error::Error` for [`Error`][crate::Error]
  and read word-list files named by the `WordList` hint and by `file:` entries
  of the `ValidValues` hint. Without it, a hint that names a file is a
  configuration error.

* **`log`**: Enable logging with [the `log` crate](https://docs.rs/log). Each
  applied candidate is logged at `debug`, each candidate left unapplied at
  `warn`, and candidate enumeration at `trace`.

* **`check`** (default): Enable the `malform::check` module for checking
  properties of mutators in tests. Implies `std` and `log`.

 */
