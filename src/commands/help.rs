use colored::Colorize;

use crate::models::constants::{DATA_FILE_UNIQUE_TAG, TAG_SCORE_NAMESPACE, TAG_THIS_FILE_TAG};

/// Explanation of the data file, marking files, and writing score definitions.
pub fn scoring_help() -> String {
    format!(
        "The data file:\n\
         To keep tag scores inside the client, tagscore adds a data file to it. \
         The data file carries the scores of your tags as tags of its own, so tagscore \
         stays removable and easy to move: transfer the data file with its tags to a \
         new client and you are on your way again.\n\
         The data file is given the tag '{DATA_FILE_UNIQUE_TAG}'.\n\
         \n\
         Tagging files for scoring:\n\
         tagscore only scores files that have the tag '{TAG_THIS_FILE_TAG}', \
         so you fully control which files are scored.\n\
         (You can hide this namespace in the client's options if you want.)\n\
         \n\
         Scoring tags:\n\
         To score a tag, add a tag to the data file in this form:\n\
         {TAG_SCORE_NAMESPACE}:namespace:tag:score\n\
         where score is a positive or negative whole number that fits in 64 bits. \
         For tags without a namespace leave out the namespace and its colon.\n\
         A file's score is the average score of its scored tags.\n\
         \n\
         Examples:\n\
         Give the tag 'test' a score of +10:\n\
         {TAG_SCORE_NAMESPACE}:test:10\n\
         Give the tag 'test' a score of -10:\n\
         {TAG_SCORE_NAMESPACE}:test:-10\n\
         Give the tag 'character:queen elsa of arendelle' a score of +200:\n\
         {TAG_SCORE_NAMESPACE}:character:queen elsa of arendelle:200\n\
         Give the tag 'tag:with:colons' a score of 0:\n\
         {TAG_SCORE_NAMESPACE}:tag:with:colons:0"
    )
}

pub fn print_scoring_help() {
    println!("\n{}", "Scoring with tagscore".bold().underline());
    println!();
    println!("{}", scoring_help());
}
