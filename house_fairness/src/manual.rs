/*!

This is the long-form manual for `house_fairness` and `housefair`.

## Input files

All the files are expected in the input directory (`./input` by default):

* `houseResults{YEAR}.csv` (or `.xlsx` with `--input-type xlsx`) one line per candidate and
  ballot line, as published after each general election. The columns read are
  `STATE ABBREVIATION`, `STATE`, `D`, `PARTY`, `CANDIDATE NAME`, `GENERAL VOTES ` (with the
  trailing space), `GENERAL %`, `(I)` and `GE WINNER INDICATOR`.
* `houseVotes{YEAR}.csv` the statewide House votes: `State`, `General_Democratic`,
  `General_Republican`, `General_Other`.
* `apportionment{1990,2000,2010}.csv` the seats of each state after each census: `state`,
  `population`, `house_seats`.

Lines starting with `~` are comments.

## Processing

1. Rows outside the 50 states, without votes, or with the votes `n/a` / `#` are dropped.
   `Unopposed` races keep no vote count.
2. Within a district, all the lines of the same candidate name are merged into one candidate.
   The votes of the other party lines are added to the major-party line (`DFL`, `DNL` and `WF`
   count as Democratic).
3. The candidate flagged as winner of each numbered district is counted for its party.
4. The counts are checked against the apportionment of the decade of the election.
5. The metrics are computed for each state:

   * the efficiency gap `(wasted R - wasted D) / (votes D + votes R)` over the districts won by a
     major party where both major parties have a vote count. The wasted votes of the loser are all
     its votes, the wasted votes of the winner are its votes beyond `floor(total / 2) + 1`.
   * the efficiency gap seats: efficiency gap × (D seats + R seats).
   * the popular representation delta: D seats - round(statewide D share × seats).

## Output

`states-{YEAR}.json` in the output directory, with the states sorted by increasing efficiency gap
seats. A negative number means that the districting favors the Republican party.

*/
