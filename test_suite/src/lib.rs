#[cfg(test)]
mod conditions;
#[cfg(test)]
mod filtering;
#[cfg(test)]
mod json;
