#[cfg(test)]
mod common;

#[cfg(test)]
mod auth_tests;

#[cfg(test)]
mod user_tests;

#[cfg(test)]
mod court_tests;

#[cfg(test)]
mod case_tests;

#[cfg(test)]
mod judgment_tests;

#[cfg(test)]
mod document_tests;



#[cfg(test)]
mod system_tests;
